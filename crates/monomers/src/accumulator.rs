// External Crate Imports
use tracing::warn;

// Local Crate Imports
use crate::{BuildingBlock, BuildingBlockTable, Formula, MassConvention, Massive, MonomerError, Result};

// Public API ==========================================================================================================

/// What to do when a sequence names a block that isn't in the [`BuildingBlockTable`]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum UnknownBlockPolicy {
    /// Add the mass of the `UKN` placeholder, then fail with [`MonomerError::UnknownComposition`], since the missing
    /// block's composition can't be known
    #[default]
    MassOnly,
    /// Stand the `UKN` placeholder in for the missing block: its mass, composition, and leaving group are all used
    Substitute,
}

/// The running mass and elemental formula of a chain, grown one building block at a time under a single
/// [`MassConvention`]
///
/// Cloning is cheap, so "what if" additions can be made to a copy without touching the real running state. The mass is
/// a plain running `f64` sum, left unrounded so that callers can round the final total.
#[derive(Clone, Debug)]
pub struct Accumulator<'t> {
    table: &'t BuildingBlockTable,
    convention: MassConvention,
    policy: UnknownBlockPolicy,
    mass: f64,
    formula: Formula,
}

impl<'t> Accumulator<'t> {
    pub fn new(table: &'t BuildingBlockTable, convention: MassConvention) -> Self {
        Self {
            table,
            convention,
            policy: UnknownBlockPolicy::default(),
            mass: 0.0,
            formula: Formula::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: UnknownBlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Incorporates the block called `name`: its mass and composition are added, then those of its leaving group (if
    /// it has one) are subtracted
    ///
    /// # Errors
    ///
    /// Under [`UnknownBlockPolicy::MassOnly`], naming a block missing from the table returns
    /// [`MonomerError::UnknownComposition`]. By that point the `UKN` mass has already been added, so the accumulator
    /// should be considered spoiled and discarded.
    pub fn add(&mut self, name: &str) -> Result<()> {
        let table = self.table;
        let block = match table.get(name) {
            Ok(block) => block,
            Err(_) => self.fallback(name)?,
        };

        self.mass += block.mass(self.convention);
        self.formula += &block.composition;
        self.remove_leaving_group(block)
    }

    pub const fn convention(&self) -> MassConvention {
        self.convention
    }

    pub const fn mass(&self) -> f64 {
        self.mass
    }

    pub const fn formula(&self) -> &Formula {
        &self.formula
    }
}

// Private Helper Methods ==============================================================================================

impl<'t> Accumulator<'t> {
    fn fallback(&mut self, name: &str) -> Result<&'t BuildingBlock> {
        let table = self.table;
        let unknown = table.unknown();
        warn!(block = name, placeholder = %unknown.name, policy = ?self.policy, "building block not found");

        match self.policy {
            UnknownBlockPolicy::MassOnly => {
                self.mass += unknown.mass(self.convention);
                Err(MonomerError::unknown_composition(name))
            }
            UnknownBlockPolicy::Substitute => Ok(unknown),
        }
    }

    fn remove_leaving_group(&mut self, block: &BuildingBlock) -> Result<()> {
        if let Some(leaving) = &block.leaving {
            let leaving = self.table.get(leaving)?;
            self.mass -= leaving.mass(self.convention);
            self.formula -= &leaving.composition;
        }
        Ok(())
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use crate::{Element, round_dp};

    use super::*;

    static TABLE: LazyLock<BuildingBlockTable> =
        LazyLock::new(|| BuildingBlockTable::embedded().unwrap());

    fn rounded(acc: &Accumulator) -> f64 {
        round_dp(acc.mass(), 4)
    }

    fn average() -> Accumulator<'static> {
        Accumulator::new(&TABLE, MassConvention::Average)
    }

    fn monoisotopic() -> Accumulator<'static> {
        Accumulator::new(&TABLE, MassConvention::Monoisotopic)
    }

    #[test]
    fn starts_empty() {
        let acc = average();
        assert_eq!(acc.mass(), 0.0);
        assert!(acc.formula().is_empty());
        assert_eq!(acc.convention(), MassConvention::Average);
    }

    #[test]
    fn leaving_group_is_subtracted() {
        let mut acc = average();
        acc.add("A").unwrap();
        // Alanine (89.0932) minus water (18.0153)
        assert_eq!(rounded(&acc), 71.0779);
        assert_eq!(acc.formula().to_string(), "C3H5ON");

        let mut acc = monoisotopic();
        acc.add("A").unwrap();
        // The raw difference carries binary noise, which rounding removes
        assert_eq!(acc.mass(), 71.037_100_000_000_01);
        assert_eq!(rounded(&acc), 71.0371);
    }

    #[test]
    fn no_leaving_group() {
        let mut acc = average();
        acc.add("CONH2").unwrap();
        assert_eq!(rounded(&acc), 17.0305);
        assert_eq!(acc.formula().to_string(), "H3N");
    }

    #[test]
    fn leaving_group_conservation() {
        for name in ["A", "Ac", "FAM", "a", "p", "~", "CONH2"] {
            let block = TABLE.get(name).unwrap();
            let mut acc = average();
            acc.add(name).unwrap();

            let mut mass = acc.mass() - block.average_mass();
            let mut formula = *acc.formula() - block.composition;
            if let Some(leaving) = &block.leaving {
                let leaving = TABLE.get(leaving).unwrap();
                mass += leaving.average_mass();
                formula = formula + leaving.composition;
            }
            assert_eq!(round_dp(mass, 4), 0.0, "{name}");
            assert!(formula.is_empty(), "{name}");
        }
    }

    #[test]
    fn negative_counts_are_kept() {
        // The disulfide marker contributes nothing but still loses a hydrogen
        let mut acc = average();
        acc.add("~").unwrap();
        assert_eq!(acc.formula()[Element::H], -1);
        assert_eq!(rounded(&acc), -1.0079);
    }

    #[test]
    fn accumulation_is_additive() {
        let mut acc = monoisotopic();
        for name in ["CONH2", "C", "E", "A", "K", "FAM", "C", "E", "A", "Ac"] {
            acc.add(name).unwrap();
        }
        assert_eq!(rounded(&acc), 1151.3572);
        assert_eq!(acc.formula().to_string(), "C51H61O18N9S2");
    }

    #[test]
    fn clones_are_independent() {
        let mut acc = average();
        acc.add("G").unwrap();
        let mut capped = acc.clone();
        capped.add("Ac").unwrap();
        assert_eq!(rounded(&acc), 57.0513);
        assert_eq!(rounded(&capped), 99.0880);
        assert_ne!(acc.formula(), capped.formula());
    }

    #[test]
    fn unknown_block_mass_only() {
        let mut acc = average();
        acc.add("CONH2").unwrap();
        assert_eq!(
            acc.add("Xyz"),
            Err(MonomerError::UnknownComposition {
                name: "Xyz".to_owned()
            })
        );
        // The placeholder's mass is applied before the composition lookup fails
        assert_eq!(rounded(&acc), 10017.0305);
        assert_eq!(acc.formula().to_string(), "H3N");
    }

    #[test]
    fn unknown_block_substitute() {
        let mut acc = average().with_policy(UnknownBlockPolicy::Substitute);
        acc.add("CONH2").unwrap();
        acc.add("Xyz").unwrap();
        assert_eq!(rounded(&acc), 10017.0305);
        assert_eq!(acc.formula().to_string(), "H3N");

        let mut acc = monoisotopic().with_policy(UnknownBlockPolicy::Substitute);
        acc.add("Xyz").unwrap();
        assert_eq!(rounded(&acc), 10000.0);
    }

    #[test]
    fn default_policy_is_mass_only() {
        assert_eq!(UnknownBlockPolicy::default(), UnknownBlockPolicy::MassOnly);
    }
}
