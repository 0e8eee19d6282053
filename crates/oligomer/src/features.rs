// External Crate Imports
use itertools::Itertools;
use monomers::{
    Accumulator, BuildingBlock, BuildingBlockTable, Formula, MassConvention, UnknownBlockPolicy,
    round_dp,
};
use serde::Serialize;
use tracing::debug;

// Local Crate Imports
use crate::{IonSeries, MzWindow, Result, Token, tokenize};

/// The single-charge cation used to build every ion series
pub const ADDUCT: &str = "Hplus";
/// The block hypothetically added to each termination sequence to predict its capped (`-Ac`) mass
pub const CAPPING_BLOCK: &str = "Ac";

const MASS_DIGITS: usize = 4;
const SIM_ION_DIGITS: usize = 0;
const MOL_WT_ION_DIGITS: usize = 2;
const HRMS_ION_DIGITS: usize = 4;

// Public API ==========================================================================================================

/// Everything calculated for one sequence
///
/// Masses are summed as `f64`s in processing order, and only rounded (with [`round_dp`]) once they're reported, so
/// ion series are built from the unrounded totals.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Features {
    #[serde(rename = "MolWt")]
    pub mol_wt: f64,
    #[serde(rename = "Exact")]
    pub exact: f64,
    #[serde(rename = "Mol Formula")]
    pub formula: Formula,
    #[serde(rename = "HPLC-SIM Ions")]
    pub sim_ions: IonSeries,
    #[serde(rename = "MolWt Ions")]
    pub mol_wt_ions: IonSeries,
    #[serde(rename = "HRMS Ions")]
    pub hrms_ions: IonSeries,
    #[serde(rename = "Termination Sequences")]
    pub termination_sequences: Vec<TerminationSequence>,
}

/// A snapshot of a partially built chain: the blocks incorporated so far, and their mass both as-is (`-H`) and
/// after hypothetically capping with [`CAPPING_BLOCK`] (`-Ac`)
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct TerminationSequence {
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "Sequence")]
    pub sequence: String,
    #[serde(rename = "MolWt-H")]
    pub mol_wt: f64,
    #[serde(rename = "Exact-H")]
    pub exact: f64,
    #[serde(rename = "MolWt-Ac")]
    pub capped_mol_wt: f64,
    #[serde(rename = "Exact-Ac")]
    pub capped_exact: f64,
}

/// Calculates [`Features`] of sequences against a single [`BuildingBlockTable`]
///
/// The calculator holds no state between calls, so one can be shared freely between threads.
#[derive(Copy, Clone, Debug)]
pub struct Calculator<'t> {
    table: &'t BuildingBlockTable,
    adduct: &'t BuildingBlock,
    policy: UnknownBlockPolicy,
    window: MzWindow,
}

impl<'t> Calculator<'t> {
    /// # Errors
    ///
    /// Fails if the table is missing the [`ADDUCT`] or [`CAPPING_BLOCK`]
    pub fn new(table: &'t BuildingBlockTable) -> Result<Self> {
        let adduct = table.get(ADDUCT)?;
        table.get(CAPPING_BLOCK)?;

        Ok(Self {
            table,
            adduct,
            policy: UnknownBlockPolicy::default(),
            window: MzWindow::default(),
        })
    }

    #[must_use]
    pub const fn with_unknown_policy(mut self, policy: UnknownBlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_window(mut self, window: MzWindow) -> Self {
        self.window = window;
        self
    }

    pub const fn table(&self) -> &'t BuildingBlockTable {
        self.table
    }

    pub const fn unknown_policy(&self) -> UnknownBlockPolicy {
        self.policy
    }

    /// # Errors
    ///
    /// Fails if the sequence can't be tokenized, or if it names an unknown block under
    /// [`UnknownBlockPolicy::MassOnly`]; the same holds for every other calculation method
    pub fn features(&self, sequence: &str) -> Result<Features> {
        let Totals {
            average,
            monoisotopic,
            termination_sequences,
        } = self.accumulate(sequence, true)?;

        Ok(Features {
            mol_wt: round_dp(average.mass(), MASS_DIGITS),
            exact: round_dp(monoisotopic.mass(), MASS_DIGITS),
            formula: *average.formula(),
            sim_ions: self.ion_series(&average, SIM_ION_DIGITS),
            mol_wt_ions: self.ion_series(&average, MOL_WT_ION_DIGITS),
            hrms_ions: self.ion_series(&monoisotopic, HRMS_ION_DIGITS),
            termination_sequences,
        })
    }

    pub fn mol_wt(&self, sequence: &str) -> Result<f64> {
        let totals = self.accumulate(sequence, false)?;
        Ok(round_dp(totals.average.mass(), MASS_DIGITS))
    }

    pub fn exact(&self, sequence: &str) -> Result<f64> {
        let totals = self.accumulate(sequence, false)?;
        Ok(round_dp(totals.monoisotopic.mass(), MASS_DIGITS))
    }

    pub fn formula(&self, sequence: &str) -> Result<Formula> {
        let totals = self.accumulate(sequence, false)?;
        Ok(*totals.average.formula())
    }

    pub fn sim_ions(&self, sequence: &str) -> Result<IonSeries> {
        let totals = self.accumulate(sequence, false)?;
        Ok(self.ion_series(&totals.average, SIM_ION_DIGITS))
    }

    pub fn mol_wt_ions(&self, sequence: &str) -> Result<IonSeries> {
        let totals = self.accumulate(sequence, false)?;
        Ok(self.ion_series(&totals.average, MOL_WT_ION_DIGITS))
    }

    pub fn hrms_ions(&self, sequence: &str) -> Result<IonSeries> {
        let totals = self.accumulate(sequence, false)?;
        Ok(self.ion_series(&totals.monoisotopic, HRMS_ION_DIGITS))
    }

    /// Every intermediate between the first and last incorporated token, in the order they were built
    ///
    /// # Errors
    ///
    /// See [`Calculator::features`]
    pub fn termination_sequences(&self, sequence: &str) -> Result<Vec<TerminationSequence>> {
        let totals = self.accumulate(sequence, true)?;
        Ok(totals.termination_sequences)
    }
}

// Private Types =======================================================================================================

struct Totals<'t> {
    average: Accumulator<'t>,
    monoisotopic: Accumulator<'t>,
    termination_sequences: Vec<TerminationSequence>,
}

// Private Helper Methods ==============================================================================================

impl<'t> Calculator<'t> {
    fn accumulate(&self, sequence: &str, record_terminations: bool) -> Result<Totals<'t>> {
        let tokens = tokenize(sequence)?;
        let last = tokens.len() - 1;

        let mut average =
            Accumulator::new(self.table, MassConvention::Average).with_policy(self.policy);
        // NOTE: Only the average pass's formula is reported, the monoisotopic one is identical
        let mut monoisotopic =
            Accumulator::new(self.table, MassConvention::Monoisotopic).with_policy(self.policy);
        let mut termination_sequences = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            for block in token.blocks() {
                average.add(block)?;
                monoisotopic.add(block)?;
            }

            if record_terminations && 0 < index && index < last {
                let built = &tokens[..=index];
                termination_sequences.push(termination(index, built, &average, &monoisotopic)?);
            }
        }

        debug!(
            sequence,
            tokens = tokens.len(),
            mol_wt = %average.mass(),
            exact = %monoisotopic.mass(),
            "accumulated sequence"
        );

        Ok(Totals {
            average,
            monoisotopic,
            termination_sequences,
        })
    }

    fn ion_series(&self, accumulator: &Accumulator, digits: usize) -> IonSeries {
        IonSeries::new(
            accumulator.mass(),
            self.adduct,
            accumulator.convention(),
            self.window,
            digits,
        )
    }
}

fn termination(
    index: usize,
    built: &[Token],
    average: &Accumulator,
    monoisotopic: &Accumulator,
) -> Result<TerminationSequence> {
    // NOTE: Tokens are processed right-to-left, so the text is rebuilt by walking `built` backwards
    let sequence = built.iter().rev().map(|token| token.text).join(" ");
    let capped = |accumulator: &Accumulator| -> Result<f64> {
        let mut accumulator = accumulator.clone();
        accumulator.add(CAPPING_BLOCK)?;
        Ok(round_dp(accumulator.mass(), MASS_DIGITS))
    };

    Ok(TerminationSequence {
        index,
        sequence,
        mol_wt: round_dp(average.mass(), MASS_DIGITS),
        exact: round_dp(monoisotopic.mass(), MASS_DIGITS),
        capped_mol_wt: capped(average)?,
        capped_exact: capped(monoisotopic)?,
    })
}

// Module Tests ========================================================================================================
