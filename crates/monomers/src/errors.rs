use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = MonomerError> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum MonomerError {
    #[diagnostic(help("double-check for typos, or add the block to the building-block table"))]
    #[error("the building block {name:?} could not be found in the building-block table")]
    BlockLookup { name: String },

    #[diagnostic(help(
        "the mass of the missing block was estimated using the UKN placeholder, but its elemental composition \
        cannot be guessed; add the block to the building-block table to calculate a complete result"
    ))]
    #[error("the building block {name:?} is unknown, so its elemental composition could not be determined")]
    UnknownComposition { name: String },
}

impl MonomerError {
    pub(crate) fn block_lookup(name: &str) -> Self {
        let name = name.to_owned();

        Self::BlockLookup { name }
    }

    pub(crate) fn unknown_composition(name: &str) -> Self {
        let name = name.to_owned();

        Self::UnknownComposition { name }
    }
}
