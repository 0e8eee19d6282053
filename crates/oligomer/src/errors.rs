use miette::Diagnostic;
use monomers::MonomerError;
use thiserror::Error;

use crate::ParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Monomer(#[from] MonomerError),
}
