//! Building blocks for linear oligomers: their masses, elemental compositions, and the leaving groups lost when they
//! are incorporated into a growing chain

mod accumulator;
mod errors;
mod formula;
mod table;

// External Crate Imports
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Local Crate Imports
pub use accumulator::{Accumulator, UnknownBlockPolicy};
pub use errors::{MonomerError, Result};
pub use formula::{Element, Formula};
pub use table::{BuildingBlockTable, DEFAULT_CSV, TableError};

/// The placeholder row used to estimate the mass of blocks missing from a [`BuildingBlockTable`]
pub const UNKNOWN_BLOCK: &str = "UKN";

// Public API ==========================================================================================================

/// A row of a [`BuildingBlockTable`]
///
/// Masses are kept exactly as tabulated in `mol_wt` and `exact`, but every calculation (through [`Massive`]) is
/// carried out on the nearest `f64`s.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BuildingBlock {
    pub name: String,
    pub kind: BlockKind,
    pub description: String,
    pub leaving: Option<String>,
    #[serde(rename = "MolWt", with = "rust_decimal::serde::float")]
    pub mol_wt: Decimal,
    #[serde(rename = "Exact", with = "rust_decimal::serde::float")]
    pub exact: Decimal,
    pub composition: Formula,
    #[serde(skip)]
    average: f64,
    #[serde(skip)]
    monoisotopic: f64,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
pub enum BlockKind {
    #[display("Amino Acid")]
    #[serde(rename = "Amino Acid")]
    AminoAcid,
    #[display("PNA Monomer")]
    #[serde(rename = "PNA Monomer")]
    PnaMonomer,
    #[display("Protecting Group")]
    #[serde(rename = "Protecting Group")]
    ProtectingGroup,
    Fluorophore,
    #[display("Terminal Modification")]
    #[serde(rename = "Terminal Modification")]
    TerminalModification,
    Modification,
    #[display("Leaving Group")]
    #[serde(rename = "Leaving Group")]
    LeavingGroup,
    Adduct,
    Unknown,
}

/// The two parallel accounting schemes a sequence is weighed under
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Serialize)]
pub enum MassConvention {
    #[display("MolWt")]
    #[serde(rename = "MolWt")]
    Average,
    #[display("Exact")]
    #[serde(rename = "Exact")]
    Monoisotopic,
}

pub trait Massive {
    fn monoisotopic_mass(&self) -> f64;
    fn average_mass(&self) -> f64;

    fn mass(&self, convention: MassConvention) -> f64 {
        match convention {
            MassConvention::Average => self.average_mass(),
            MassConvention::Monoisotopic => self.monoisotopic_mass(),
        }
    }
}

impl Massive for BuildingBlock {
    fn monoisotopic_mass(&self) -> f64 {
        self.monoisotopic
    }

    fn average_mass(&self) -> f64 {
        self.average
    }
}

impl<T: Massive> Massive for &T {
    fn monoisotopic_mass(&self) -> f64 {
        (**self).monoisotopic_mass()
    }

    fn average_mass(&self) -> f64 {
        (**self).average_mass()
    }
}

/// Rounds `value` to `digits` decimal places
///
/// The decimal expansion of `value` is correctly rounded, so a value only rounds to even when its binary expansion is
/// an exact tie. Values like `2.675` (stored as `2.67499999...`) round down, just as Python's `round()` does.
#[must_use]
pub fn round_dp(value: f64, digits: usize) -> f64 {
    format!("{value:.digits$}").parse().unwrap_or(value)
}

// Module Tests ========================================================================================================
