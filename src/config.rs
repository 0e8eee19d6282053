// Standard Library Imports
use std::path::PathBuf;

// External Crate Imports
use clap::{Parser, ValueEnum};
use monomers::{BuildingBlockTable, TableError, UnknownBlockPolicy};
use tracing::info;

/// The log filter used when `RUST_LOG` isn't set
pub const DEFAULT_LOG_FILTER: &str = "pepmass=info,tower_http=info";

/// Serves mass-spectrometry features of PNA and peptide sequences over HTTP
#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Args {
    /// The address to listen on
    #[arg(long, env = "PEPMASS_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// The port to listen on
    #[arg(short, long, env = "PEPMASS_PORT", default_value_t = 8080)]
    pub port: u16,
    #[command(flatten)]
    pub table: TableArgs,
}

/// Which building-block table to calculate with, and how to treat blocks missing from it
///
/// Shared by the server and the REPL, so both honour the same flags and environment variables.
#[derive(clap::Args, Clone, Debug)]
pub struct TableArgs {
    /// A semicolon-separated building-block table to use instead of the built-in one
    #[arg(short, long, env = "PEPMASS_BUILDING_BLOCKS")]
    pub building_blocks: Option<PathBuf>,
    /// What to do with blocks missing from the building-block table
    #[arg(long, env = "PEPMASS_UNKNOWN_BLOCKS", value_enum, default_value_t)]
    pub unknown_blocks: UnknownBlocks,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum)]
pub enum UnknownBlocks {
    /// Weigh missing blocks as the placeholder, but reject the sequence since its formula is unknown
    #[default]
    MassOnly,
    /// Use the placeholder's mass, formula, and leaving group in place of missing blocks
    Substitute,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TableArgs {
    pub fn unknown_policy(&self) -> UnknownBlockPolicy {
        self.unknown_blocks.into()
    }

    /// # Errors
    ///
    /// Fails if the table file can't be read or fails validation
    pub fn load_table(&self) -> Result<BuildingBlockTable, TableError> {
        let table = match &self.building_blocks {
            Some(path) => BuildingBlockTable::from_path(path)?,
            None => BuildingBlockTable::embedded()?,
        };
        let source = self
            .building_blocks
            .as_ref()
            .map_or_else(|| "built-in".to_owned(), |path| path.display().to_string());
        info!(blocks = table.len(), %source, "loaded building-block table");
        Ok(table)
    }
}

impl From<UnknownBlocks> for UnknownBlockPolicy {
    fn from(value: UnknownBlocks) -> Self {
        match value {
            UnknownBlocks::MassOnly => Self::MassOnly,
            UnknownBlocks::Substitute => Self::Substitute,
        }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["pepmass"]).unwrap();
        assert_eq!(args.bind_addr(), "0.0.0.0:8080");
        assert_eq!(args.table.building_blocks, None);
        assert_eq!(args.table.unknown_blocks, UnknownBlocks::MassOnly);
        assert_eq!(
            UnknownBlockPolicy::from(args.table.unknown_blocks),
            UnknownBlockPolicy::MassOnly
        );
    }

    #[test]
    fn flags() {
        let args = Args::try_parse_from([
            "pepmass",
            "--host",
            "127.0.0.1",
            "-p",
            "3000",
            "--building-blocks",
            "blocks.csv",
            "--unknown-blocks",
            "substitute",
        ])
        .unwrap();
        assert_eq!(args.bind_addr(), "127.0.0.1:3000");
        assert_eq!(args.table.building_blocks, Some(PathBuf::from("blocks.csv")));
        assert_eq!(args.table.unknown_policy(), UnknownBlockPolicy::Substitute);
    }

    #[test]
    fn table_flags_stand_alone() {
        #[derive(Parser)]
        struct Repl {
            #[command(flatten)]
            table: TableArgs,
        }

        let repl = Repl::try_parse_from(["pepmass-repl", "--unknown-blocks", "substitute"]).unwrap();
        assert_eq!(repl.table.unknown_policy(), UnknownBlockPolicy::Substitute);
        assert_eq!(repl.table.building_blocks, None);
        assert!(Repl::try_parse_from(["pepmass-repl", "--port", "3000"]).is_err());
    }

    #[test]
    fn bad_flags() {
        assert!(Args::try_parse_from(["pepmass", "--unknown-blocks", "ignore"]).is_err());
        assert!(Args::try_parse_from(["pepmass", "--port", "http"]).is_err());
    }

    #[test]
    fn load_embedded_table() {
        let args = Args::try_parse_from(["pepmass"]).unwrap();
        let table = args.table.load_table().unwrap();
        assert_eq!(table.len(), 76);
    }

    #[test]
    fn load_missing_table() {
        let args = Args::try_parse_from(["pepmass", "-b", "no/such/blocks.csv"]).unwrap();
        assert!(args.table.load_table().is_err());
    }
}
