// External Crate Imports
use monomers::{MassConvention, Massive, round_dp};
use serde::{Serialize, Serializer, ser::SerializeMap};

/// The highest charge state considered when building an [`IonSeries`]
pub const MAX_CHARGE: u32 = 100;

// Public API ==========================================================================================================

/// The open interval of m/z values that an instrument is expected to detect
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MzWindow {
    min: f64,
    max: f64,
}

impl MzWindow {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds are exclusive: an m/z that rounds to exactly `min` or `max` is left out
    pub fn contains(&self, mz: f64) -> bool {
        self.min < mz && mz < self.max
    }
}

impl Default for MzWindow {
    fn default() -> Self {
        Self::new(100.0, 50_000.0)
    }
}

/// The m/z of every charge state (from [`MAX_CHARGE`] down to 1) that falls inside an [`MzWindow`]
///
/// Charge states are kept in descending order, which is also the order they are serialized in.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct IonSeries(Vec<(u32, f64)>);

impl IonSeries {
    /// Each charge state `z` carries `z` copies of the `adduct`, so its m/z is `(mass + z * adduct) / z`, rounded to
    /// `digits` decimal places (see [`round_dp`]) before being checked against the `window`
    pub fn new(
        mass: f64,
        adduct: impl Massive,
        convention: MassConvention,
        window: MzWindow,
        digits: usize,
    ) -> Self {
        let adduct_mass = adduct.mass(convention);
        let ions = (1..=MAX_CHARGE)
            .rev()
            .filter_map(|z| {
                let charge = f64::from(z);
                let mz = round_dp((mass + charge * adduct_mass) / charge, digits);
                window.contains(mz).then_some((z, mz))
            })
            .collect();
        Self(ions)
    }

    pub fn get(&self, charge: u32) -> Option<f64> {
        self.iter().find_map(|(z, mz)| (z == charge).then_some(mz))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn charges(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(z, _)| z)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for IonSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (charge, mz) in self.iter() {
            map.serialize_entry(&charge, &mz)?;
        }
        map.end()
    }
}

// Module Tests ========================================================================================================
