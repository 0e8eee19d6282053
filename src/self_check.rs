// Standard Library Imports
use std::fmt::Display;

// External Crate Imports
use miette::Diagnostic;
use oligomer::{Calculator, IonSeries};
use thiserror::Error;
use tracing::info;

/// The sequence weighed at startup to make sure that the building-block table hasn't drifted
pub const REFERENCE_SEQUENCE: &str = "Ac A E C K(FAM) A E C CONH2";

const MOL_WT: f64 = 1152.2096;
const EXACT: f64 = 1151.3572;
const FORMULA: &str = "C51H61O18N9S2";

// NOTE: Each entry is a (charge, m/z) pair, from the highest charge down to 1
const SIM_IONS: [(u32, f64); 11] = [
    (11, 106.0),
    (10, 116.0),
    (9, 129.0),
    (8, 145.0),
    (7, 166.0),
    (6, 193.0),
    (5, 231.0),
    (4, 289.0),
    (3, 385.0),
    (2, 577.0),
    (1, 1153.0),
];
const MOL_WT_IONS: [(u32, f64); 11] = [
    (11, 105.75),
    (10, 116.23),
    (9, 129.03),
    (8, 145.03),
    (7, 165.61),
    (6, 193.04),
    (5, 231.45),
    (4, 289.06),
    (3, 385.08),
    (2, 577.11),
    (1, 1153.22),
];
const HRMS_IONS: [(u32, f64); 11] = [
    (11, 105.6766),
    (10, 116.1435),
    (9, 128.9364),
    (8, 144.9274),
    (7, 165.4874),
    (6, 192.9007),
    (5, 231.2792),
    (4, 288.8471),
    (3, 384.7935),
    (2, 576.6864),
    (1, 1152.3650),
];

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum IntegrityError {
    #[diagnostic(help(
        "the building-block table has likely been edited; check the masses and compositions of the blocks in the \
        reference sequence"
    ))]
    #[error("self-check failed: expected {field} of {expected}, but found {found}")]
    Mismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[diagnostic(help(
        "every block in the reference sequence (and the proton adduct) must be present in the building-block table"
    ))]
    #[error("self-check failed: the reference sequence could not be calculated")]
    Calculation(#[from] oligomer::Error),
}

/// Calculates the features of [`REFERENCE_SEQUENCE`] and compares them with known-good values
///
/// # Errors
///
/// Returns the first field that doesn't match, or the error raised while calculating the reference sequence
pub fn self_check(calculator: &Calculator) -> Result<(), IntegrityError> {
    let features = calculator.features(REFERENCE_SEQUENCE)?;

    compare("MolWt", &MOL_WT, &features.mol_wt)?;
    compare("Exact", &EXACT, &features.exact)?;
    compare("Mol Formula", FORMULA, features.formula.to_string().as_str())?;
    compare_ions("HPLC-SIM Ions", &SIM_IONS, &features.sim_ions)?;
    compare_ions("MolWt Ions", &MOL_WT_IONS, &features.mol_wt_ions)?;
    compare_ions("HRMS Ions", &HRMS_IONS, &features.hrms_ions)?;

    info!(sequence = REFERENCE_SEQUENCE, mol_wt = %features.mol_wt, "self-check passed");
    Ok(())
}

// Private Helper Methods ==============================================================================================

fn compare<T: PartialEq + Display + ?Sized>(
    field: &'static str,
    expected: &T,
    found: &T,
) -> Result<(), IntegrityError> {
    if expected == found {
        Ok(())
    } else {
        Err(IntegrityError::Mismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

fn compare_ions(
    field: &'static str,
    expected: &[(u32, f64)],
    found: &IonSeries,
) -> Result<(), IntegrityError> {
    let found: Vec<_> = found.iter().collect();
    if expected == found {
        Ok(())
    } else {
        Err(IntegrityError::Mismatch {
            field,
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        })
    }
}

// Module Tests ========================================================================================================
