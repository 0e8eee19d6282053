// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    iter::zip,
    ops::{Add, AddAssign, Index, IndexMut, Neg, Sub, SubAssign},
};

// External Crate Imports
use derive_more::Display;
use serde::{Serialize, Serializer, ser::SerializeMap};

// Public API ==========================================================================================================

/// The elements tracked by the building-block table, in column order
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub enum Element {
    C,
    H,
    O,
    N,
    S,
    Cl,
    I,
    P,
    Br,
}

impl Element {
    pub const ALL: [Self; 9] = [
        Self::C,
        Self::H,
        Self::O,
        Self::N,
        Self::S,
        Self::Cl,
        Self::I,
        Self::P,
        Self::Br,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::H => "H",
            Self::O => "O",
            Self::N => "N",
            Self::S => "S",
            Self::Cl => "Cl",
            Self::I => "I",
            Self::P => "P",
            Self::Br => "Br",
        }
    }
}

/// Integer atom counts for every tracked [`Element`]
///
/// Counts are signed: subtracting a leaving group before anything has been added to balance it leaves a negative
/// count, and that is reported as-is rather than clamped.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Formula([i64; Element::ALL.len()]);

impl Formula {
    pub const fn new(counts: [i64; Element::ALL.len()]) -> Self {
        Self(counts)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Element, i64)> + '_ {
        zip(Element::ALL, self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }
}

// Display and Serialize Trait Implementations =========================================================================

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (element, count) in self.iter().filter(|&(_, count)| count != 0) {
            if count == 1 {
                write!(f, "{element}")?;
            } else {
                write!(f, "{element}{count}")?;
            }
        }

        Ok(())
    }
}

// NOTE: Serialized as a map so that JSON consumers see `{"C": 51, "H": 61, ...}`, zero counts included
impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (element, count) in self.iter() {
            map.serialize_entry(element.symbol(), &count)?;
        }
        map.end()
    }
}

// Arithmetic Trait Implementations ====================================================================================

impl Index<Element> for Formula {
    type Output = i64;

    fn index(&self, element: Element) -> &Self::Output {
        &self.0[element as usize]
    }
}

impl IndexMut<Element> for Formula {
    fn index_mut(&mut self, element: Element) -> &mut Self::Output {
        &mut self.0[element as usize]
    }
}

impl AddAssign<&Self> for Formula {
    fn add_assign(&mut self, rhs: &Self) {
        for (count, other) in zip(&mut self.0, rhs.0) {
            *count += other;
        }
    }
}

impl SubAssign<&Self> for Formula {
    fn sub_assign(&mut self, rhs: &Self) {
        for (count, other) in zip(&mut self.0, rhs.0) {
            *count -= other;
        }
    }
}

impl Add for Formula {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += &rhs;
        self
    }
}

impl Sub for Formula {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self -= &rhs;
        self
    }
}

impl Neg for Formula {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.map(|count| -count))
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn element_order_matches_symbols() {
        let symbols: Vec<_> = Element::ALL.iter().map(|e| e.to_string()).collect();
        assert_eq!(symbols, ["C", "H", "O", "N", "S", "Cl", "I", "P", "Br"]);
        for element in Element::ALL {
            assert_eq!(element.symbol(), element.to_string());
        }
    }

    #[test]
    fn display_skips_zero_and_unit_counts() {
        let peptide = Formula::new([51, 61, 18, 9, 2, 0, 0, 0, 0]);
        assert_snapshot!(peptide, @"C51H61O18N9S2");
        let phosphotyrosine = Formula::new([9, 10, 5, 1, 0, 0, 0, 1, 0]);
        assert_snapshot!(phosphotyrosine, @"C9H10O5NP");
        let lost_hydrogen = Formula::new([0, -1, 0, 0, 0, 0, 0, 0, 0]);
        assert_snapshot!(lost_hydrogen, @"H-1");
        assert_eq!(Formula::default().to_string(), "");
    }

    #[test]
    fn arithmetic() {
        let alanine = Formula::new([3, 7, 2, 1, 0, 0, 0, 0, 0]);
        let water = Formula::new([0, 2, 1, 0, 0, 0, 0, 0, 0]);
        let residue = alanine - water;
        assert_eq!(residue, Formula::new([3, 5, 1, 1, 0, 0, 0, 0, 0]));
        assert_eq!(residue + water, alanine);
        assert_eq!(residue[Element::H], 5);
        assert_eq!(-water + water, Formula::default());
        assert!((water - water).is_empty());

        let mut running = Formula::default();
        running -= &water;
        assert_eq!(running[Element::O], -1);
        running[Element::Br] += 2;
        assert_snapshot!(running, @"H-2O-1Br2");
    }

    #[test]
    fn serialize_all_elements_in_order() {
        let water = Formula::new([0, 2, 1, 0, 0, 0, 0, 0, 0]);
        assert_snapshot!(
            serde_json::to_string(&water).unwrap(),
            @r#"{"C":0,"H":2,"O":1,"N":0,"S":0,"Cl":0,"I":0,"P":0,"Br":0}"#
        );
    }
}
