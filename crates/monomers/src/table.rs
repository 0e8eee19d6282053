// Standard Library Imports
use std::{fs, path::Path, str::FromStr};

// External Crate Imports
use ahash::RandomState;
use csv::{Position, ReaderBuilder, Trim};
use indexmap::{IndexMap, map::Entry};
use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;
use tracing::debug;

// Local Crate Imports
use crate::{BlockKind, BuildingBlock, Formula, MonomerError, Result, UNKNOWN_BLOCK};

/// The building-block table shipped with this crate
pub const DEFAULT_CSV: &str = include_str!("../data/building_blocks.csv");

const DEFAULT_FILE_NAME: &str = "building_blocks.csv";
const NO_LEAVING_GROUP: &str = "---";

// Public API ==========================================================================================================

/// An immutable, validated set of [`BuildingBlock`]s, keyed by name and kept in file order
#[derive(Clone, PartialEq, Debug)]
pub struct BuildingBlockTable {
    blocks: IndexMap<String, BuildingBlock, RandomState>,
    unknown: usize,
}

impl BuildingBlockTable {
    /// Parses and validates a semicolon-separated building-block table
    ///
    /// # Errors
    ///
    /// Fails if a row is malformed, a block is defined twice, a leaving group doesn't refer to another block, or the
    /// `UKN` placeholder row is missing. Errors carry labels pointing into `csv_text`.
    pub fn new(file_name: impl AsRef<str>, csv_text: impl AsRef<str>) -> Result<Self, TableError> {
        let csv_text = csv_text.as_ref();
        parse_rows(csv_text)
            .and_then(|rows| validate(csv_text, rows))
            .map_err(|kind| kind.finalize(file_name, csv_text))
    }

    /// # Errors
    ///
    /// Only fails if the embedded table has been broken at compile time
    pub fn embedded() -> Result<Self, TableError> {
        Self::new(DEFAULT_FILE_NAME, DEFAULT_CSV)
    }

    /// # Errors
    ///
    /// Fails if the file can't be read, or for any of the reasons that [`BuildingBlockTable::new`] does
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let csv_text = fs::read_to_string(path).map_err(|error| TableError::io(&file_name, error))?;
        Self::new(file_name, csv_text)
    }

    /// # Errors
    ///
    /// Returns [`MonomerError::BlockLookup`] if no block is called `name`
    pub fn get(&self, name: &str) -> Result<&BuildingBlock> {
        self.blocks
            .get(name)
            .ok_or_else(|| MonomerError::block_lookup(name))
    }

    pub fn unknown(&self) -> &BuildingBlock {
        &self.blocks[self.unknown]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingBlock> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Groups blocks by their [`BlockKind`], with kinds ordered by first appearance in the table
    pub fn by_kind(&self) -> IndexMap<BlockKind, Vec<&BuildingBlock>, RandomState> {
        let mut groups: IndexMap<_, Vec<_>, _> = IndexMap::default();
        for block in self.iter() {
            groups.entry(block.kind).or_default().push(block);
        }
        groups
    }
}

impl<'t> IntoIterator for &'t BuildingBlockTable {
    type Item = &'t BuildingBlock;
    type IntoIter = indexmap::map::Values<'t, String, BuildingBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.values()
    }
}

// CSV File Schema =====================================================================================================

#[derive(Debug, Deserialize)]
struct BuildingBlockRow {
    #[serde(rename = "Group")]
    name: String,
    #[serde(rename = "Type")]
    kind: BlockKind,
    #[serde(rename = "Name")]
    description: String,
    #[serde(rename = "Leaving")]
    leaving: String,
    #[serde(rename = "MolWt", deserialize_with = "tabulated_mass")]
    average_mass: (Decimal, f64),
    #[serde(rename = "Exact", deserialize_with = "tabulated_mass")]
    monoisotopic_mass: (Decimal, f64),
    #[serde(rename = "C")]
    carbon: i64,
    #[serde(rename = "H")]
    hydrogen: i64,
    #[serde(rename = "O")]
    oxygen: i64,
    #[serde(rename = "N")]
    nitrogen: i64,
    #[serde(rename = "S")]
    sulfur: i64,
    #[serde(rename = "Cl")]
    chlorine: i64,
    #[serde(rename = "I")]
    iodine: i64,
    #[serde(rename = "P")]
    phosphorus: i64,
    #[serde(rename = "Br")]
    bromine: i64,
}

impl From<BuildingBlockRow> for BuildingBlock {
    fn from(row: BuildingBlockRow) -> Self {
        let composition = Formula::new([
            row.carbon,
            row.hydrogen,
            row.oxygen,
            row.nitrogen,
            row.sulfur,
            row.chlorine,
            row.iodine,
            row.phosphorus,
            row.bromine,
        ]);
        let leaving = (row.leaving != NO_LEAVING_GROUP).then_some(row.leaving);
        let (mol_wt, average) = row.average_mass;
        let (exact, monoisotopic) = row.monoisotopic_mass;

        Self {
            name: row.name,
            kind: row.kind,
            description: row.description,
            leaving,
            mol_wt,
            exact,
            composition,
            average,
            monoisotopic,
        }
    }
}

// NOTE: The `f64` is parsed straight from the text, rather than converted from the `Decimal`, so that it's always the
// nearest `f64` to the tabulated mass
fn tabulated_mass<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(Decimal, f64), D::Error> {
    let text = String::deserialize(deserializer)?;
    let tabulated = Decimal::from_str(&text).map_err(de::Error::custom)?;
    let value = text.parse().map_err(de::Error::custom)?;
    Ok((tabulated, value))
}

type RowEntry = (BuildingBlock, SourceSpan);

fn parse_rows(csv_text: &str) -> Result<Vec<RowEntry>, TableErrorKind> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| TableErrorKind::Malformed(line_span(csv_text, e.position()), e))?
        .clone();

    reader
        .records()
        .map(|record| {
            let record = record
                .map_err(|e| TableErrorKind::Malformed(line_span(csv_text, e.position()), e))?;
            let span = line_span(csv_text, record.position());
            let row: BuildingBlockRow = record
                .deserialize(Some(&headers))
                .map_err(|e| TableErrorKind::Malformed(span, e))?;
            Ok((row.into(), span))
        })
        .collect()
}

fn validate(csv_text: &str, rows: Vec<RowEntry>) -> Result<BuildingBlockTable, TableErrorKind> {
    let mut blocks: IndexMap<_, RowEntry, RandomState> = IndexMap::default();
    for (block, span) in rows {
        match blocks.entry(block.name.clone()) {
            Entry::Occupied(e) => {
                let (_, first_span) = e.get();
                return Err(TableErrorKind::DuplicateBlock(*first_span, span, block.name));
            }
            Entry::Vacant(e) => {
                e.insert((block, span));
            }
        }
    }

    for (block, span) in blocks.values() {
        if let Some(leaving) = &block.leaving {
            if !blocks.contains_key(leaving) {
                return Err(TableErrorKind::UndefinedLeavingGroup(
                    *span,
                    block.name.clone(),
                    leaving.clone(),
                ));
            }
        }
    }

    let unknown = blocks
        .get_index_of(UNKNOWN_BLOCK)
        .ok_or_else(|| TableErrorKind::MissingUnknownBlock(line_span(csv_text, None)))?;

    let blocks: IndexMap<_, _, _> = blocks
        .into_iter()
        .map(|(name, (block, _))| (name, block))
        .collect();
    debug!(blocks = blocks.len(), "loaded building-block table");

    Ok(BuildingBlockTable { blocks, unknown })
}

// NOTE: Without a position, this falls back to labelling the header line
fn line_span(csv_text: &str, position: Option<&Position>) -> SourceSpan {
    let start = position.map_or(0, |p| usize::try_from(p.byte()).unwrap_or_default());
    let start = start.min(csv_text.len());
    let line = csv_text[start..].lines().next().unwrap_or_default();
    SourceSpan::from(start..start + line.len())
}

// Validation Error Types and Trait Implementations ====================================================================

#[derive(Debug, Error)]
#[error("failed to validate building-block table")]
pub struct TableError {
    csv: NamedSource<String>,
    #[source]
    kind: TableErrorKind,
}

impl TableError {
    fn io(file_name: &str, error: std::io::Error) -> Self {
        TableErrorKind::Io(error).finalize(file_name, "")
    }
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for TableError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.csv)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Debug, Diagnostic, Error)]
enum TableErrorKind {
    #[error("the building-block table could not be read")]
    Io(#[source] std::io::Error),

    #[error("the row could not be parsed as a building block")]
    #[diagnostic(help(
        "every row needs a Group, Type, Name, and Leaving group (or ---), two decimal masses, and an integer count \
        for each element column"
    ))]
    Malformed(SourceSpan, #[source] csv::Error),

    #[error("the building block {2:?} has already been defined")]
    #[diagnostic(help("remove the duplicate row, or pick a new name for one of the blocks"))]
    DuplicateBlock(SourceSpan, SourceSpan, String),

    #[error("the leaving group {2:?} of the building block {1:?} is undefined")]
    #[diagnostic(help("double-check for typos, add a row for {2:?}, or use --- if nothing is lost"))]
    UndefinedLeavingGroup(SourceSpan, String, String),

    #[error("the building-block table is missing the \"UKN\" placeholder row")]
    #[diagnostic(help("add a UKN row, which is used to estimate the mass of blocks missing from the table"))]
    MissingUnknownBlock(SourceSpan),
}

impl TableErrorKind {
    fn labels(&self) -> Vec<(&SourceSpan, &'static str)> {
        match self {
            Self::Io(_) => Vec::new(),
            Self::Malformed(s, _) => vec![(s, "malformed row")],
            Self::DuplicateBlock(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::UndefinedLeavingGroup(s, _, _) => vec![(s, "undefined leaving group")],
            Self::MissingUnknownBlock(s) => vec![(s, "no UKN row in this table")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, csv: impl AsRef<str>) -> TableError {
        let csv = NamedSource::new(file_name, csv.as_ref().to_owned());
        TableError { csv, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use miette::{GraphicalReportHandler, GraphicalTheme};
    use rust_decimal_macros::dec;

    use crate::{Element, Massive};

    use super::*;

    const HEADER: &str = "Group;Type;Name;Leaving;MolWt;Exact;C;H;O;N;S;Cl;I;P;Br\n";

    fn render(error: &TableError) -> String {
        let mut out = String::new();
        GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
            .with_width(120)
            .render_report(&mut out, error)
            .unwrap();
        out
    }

    fn table(rows: &str) -> Result<BuildingBlockTable, TableError> {
        BuildingBlockTable::new("test.csv", format!("{HEADER}{rows}"))
    }

    #[test]
    fn load_embedded_table() {
        let table = BuildingBlockTable::embedded().unwrap();
        assert_eq!(table.len(), 76);
        assert!(!table.is_empty());

        let ac = table.get("Ac").unwrap();
        assert_eq!(ac.kind, BlockKind::TerminalModification);
        assert_eq!(ac.leaving.as_deref(), Some("H2O"));
        assert_eq!(ac.mol_wt, dec!(60.0520));
        assert_eq!(ac.average_mass(), 60.052);
        assert_eq!(ac.composition.to_string(), "C2H4O2");

        let amide = table.get("CONH2").unwrap();
        assert_eq!(amide.leaving, None);
        assert_eq!(amide.composition[Element::N], 1);

        let fam = table.get("FAM").unwrap();
        assert_eq!(fam.kind, BlockKind::Fluorophore);
        assert_eq!(fam.exact, dec!(376.0583));
        assert_eq!(fam.monoisotopic_mass(), 376.0583);

        assert_eq!(table.unknown().name, UNKNOWN_BLOCK);
        assert_eq!(table.unknown().mol_wt, dec!(10000));
        assert_eq!(table.unknown().average_mass(), 10_000.0);
        assert!(table.unknown().composition.is_empty());
    }

    #[test]
    fn every_leaving_group_resolves() {
        let table = BuildingBlockTable::embedded().unwrap();
        for block in &table {
            if let Some(leaving) = &block.leaving {
                assert!(table.get(leaving).is_ok(), "{} loses {leaving}", block.name);
            }
        }
    }

    #[test]
    fn lookup_missing_block() {
        let table = BuildingBlockTable::embedded().unwrap();
        assert_eq!(
            table.get("Xyz"),
            Err(MonomerError::BlockLookup {
                name: "Xyz".to_owned()
            })
        );
        // Lookups are case-sensitive: `a` is a PNA monomer, `A` is alanine
        assert_eq!(table.get("a").unwrap().kind, BlockKind::PnaMonomer);
        assert_eq!(table.get("A").unwrap().kind, BlockKind::AminoAcid);
    }

    #[test]
    fn group_by_kind_in_file_order() {
        let table = BuildingBlockTable::embedded().unwrap();
        let groups = table.by_kind();
        let kinds: Vec<_> = groups.keys().map(ToString::to_string).collect();
        assert_eq!(
            kinds,
            [
                "Leaving Group",
                "Adduct",
                "Unknown",
                "Amino Acid",
                "PNA Monomer",
                "Protecting Group",
                "Fluorophore",
                "Terminal Modification",
                "Modification",
            ]
        );
        let pna: Vec<_> = groups[&BlockKind::PnaMonomer]
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(pna, ["a", "c", "g", "t"]);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), table.len());
    }

    #[test]
    fn minimal_table() {
        let table = table(indoc! {"
            H2O;Leaving Group;Water;---;18.0153;18.0106;0;2;1;0;0;0;0;0;0
            UKN;Unknown;Unknown building block;---;10000.0000;10000.0000;0;0;0;0;0;0;0;0;0
            G;Amino Acid;Glycine;H2O;75.0666;75.0320;2;5;2;1;0;0;0;0;0
        "})
        .unwrap();
        assert_eq!(table.len(), 3);
        let names: Vec<_> = table.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["H2O", "UKN", "G"]);
        assert_eq!(table.unknown().description, "Unknown building block");
    }

    #[test]
    fn duplicate_block() {
        let error = table(indoc! {"
            UKN;Unknown;Unknown building block;---;10000.0000;10000.0000;0;0;0;0;0;0;0;0;0
            G;Amino Acid;Glycine;---;75.0666;75.0320;2;5;2;1;0;0;0;0;0
            G;Amino Acid;Glycine again;---;75.0666;75.0320;2;5;2;1;0;0;0;0;0
        "})
        .unwrap_err();
        assert!(matches!(error.kind, TableErrorKind::DuplicateBlock(_, _, ref name) if name == "G"));
        let labels: Vec<_> = error.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("first defined here"));
        assert_eq!(labels[1].label(), Some("then again here"));
        assert!(labels[0].offset() < labels[1].offset());

        let report = render(&error);
        assert!(report.contains("the building block \"G\" has already been defined"));
        assert!(report.contains("test.csv"));
    }

    #[test]
    fn undefined_leaving_group() {
        let error = table(indoc! {"
            UKN;Unknown;Unknown building block;---;10000.0000;10000.0000;0;0;0;0;0;0;0;0;0
            G;Amino Acid;Glycine;H2O;75.0666;75.0320;2;5;2;1;0;0;0;0;0
        "})
        .unwrap_err();
        assert!(matches!(
            error.kind,
            TableErrorKind::UndefinedLeavingGroup(_, ref block, ref leaving) if block == "G" && leaving == "H2O"
        ));
        assert_eq!(
            error.kind.to_string(),
            r#"the leaving group "H2O" of the building block "G" is undefined"#
        );
    }

    #[test]
    fn missing_unknown_block() {
        let error = table(indoc! {"
            G;Amino Acid;Glycine;---;75.0666;75.0320;2;5;2;1;0;0;0;0;0
        "})
        .unwrap_err();
        assert!(matches!(error.kind, TableErrorKind::MissingUnknownBlock(_)));
        let labels: Vec<_> = error.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 0);
        assert_eq!(labels[0].len(), HEADER.trim_end().len());
    }

    #[test]
    fn malformed_rows() {
        let bad_mass = table("G;Amino Acid;Glycine;---;heavy;75.0320;2;5;2;1;0;0;0;0;0\n").unwrap_err();
        assert!(matches!(bad_mass.kind, TableErrorKind::Malformed(..)));
        let labels: Vec<_> = bad_mass.labels().unwrap().collect();
        assert_eq!(labels[0].offset(), HEADER.len());
        assert_eq!(labels[0].label(), Some("malformed row"));

        let bad_type = table("G;Amino;Glycine;---;75.0666;75.0320;2;5;2;1;0;0;0;0;0\n").unwrap_err();
        assert!(matches!(bad_type.kind, TableErrorKind::Malformed(..)));

        let bad_count = table("G;Amino Acid;Glycine;---;75.0666;75.0320;2;5;2;1.5;0;0;0;0;0\n").unwrap_err();
        assert!(matches!(bad_count.kind, TableErrorKind::Malformed(..)));

        let short_row = table("G;Amino Acid;Glycine;---;75.0666\n").unwrap_err();
        assert!(matches!(short_row.kind, TableErrorKind::Malformed(..)));
    }

    #[test]
    fn missing_file() {
        let error = BuildingBlockTable::from_path("does/not/exist.csv").unwrap_err();
        assert!(matches!(error.kind, TableErrorKind::Io(_)));
        assert!(error.labels().unwrap().next().is_none());
    }
}
