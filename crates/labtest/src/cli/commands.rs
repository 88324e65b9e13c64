//! CLI command definitions.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand, ValueEnum};

use crate::calc::TestType;
use crate::records::Collection;

/// Calculation command arguments.
#[derive(Debug, Args)]
pub struct CalcCommand {
    /// Which calculation to run
    #[arg(value_enum)]
    pub test: TestTypeArg,

    /// Input field as NAME=VALUE (repeatable)
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Calculation kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestTypeArg {
    /// Sand cone compaction
    Compaction,
    /// Concrete cylinder strength
    Cylinder,
    /// Concrete beam modulus of rupture
    Beam,
    /// Mortar cube strength
    Mortar,
    /// Granulometry
    Granulometry,
    /// Asphalt content gradation
    AsphaltContent,
    /// Washed fine sieves
    WashedSieve,
}

impl From<TestTypeArg> for TestType {
    fn from(arg: TestTypeArg) -> Self {
        match arg {
            TestTypeArg::Compaction => Self::Compaction,
            TestTypeArg::Cylinder => Self::Cylinder,
            TestTypeArg::Beam => Self::Beam,
            TestTypeArg::Mortar => Self::Mortar,
            TestTypeArg::Granulometry => Self::Granulometry,
            TestTypeArg::AsphaltContent => Self::AsphaltContent,
            TestTypeArg::WashedSieve => Self::WashedSieve,
        }
    }
}

/// Record collections accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    /// Concrete specimens
    Concrete,
    /// Soil samples
    Soil,
}

impl From<CollectionArg> for Collection {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Concrete => Self::Concrete,
            CollectionArg::Soil => Self::Soil,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per record
    #[default]
    Plain,
    /// JSON array
    Json,
}

/// A calendar month written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{s}'"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 1 and 12, got {month}"));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Record management commands.
#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// Register a new test from form fields
    Register {
        /// Target collection
        #[arg(value_enum)]
        collection: CollectionArg,

        /// Form field as NAME=VALUE (repeatable)
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Number of concrete specimens (overrides noEspecimenes)
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// List stored records
    List {
        /// Collection to list
        #[arg(value_enum)]
        collection: CollectionArg,

        /// Only show records containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show how many records fall on each day of a month
    Daily {
        /// Month to report (defaults to the current month)
        #[arg(short, long, value_name = "YYYY-MM")]
        month: Option<YearMonth>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show counters and record totals
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete every record and reset the id sequence
    Clear {
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,

        /// Administrator code, when one is configured
        #[arg(long)]
        code: Option<String>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
