//! Mass-spectrometry features of linear oligomers (peptides, PNAs, and their modifications) written as
//! whitespace-separated sequences of building blocks

mod errors;
mod features;
mod ions;
mod parser;

pub use errors::{Error, Result};
pub use features::{ADDUCT, CAPPING_BLOCK, Calculator, Features, TerminationSequence};
pub use ions::{IonSeries, MAX_CHARGE, MzWindow};
pub use parser::{ParseError, ParseErrorKind, Token, tokenize};
