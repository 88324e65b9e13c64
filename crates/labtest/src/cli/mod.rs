//! Command-line interface for labtest.
//!
//! This module provides the CLI structure for the `labtest` binary and the
//! few decisions that do not need a store, such as whether a clear request
//! is authorized.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AdminConfig;
use crate::error::{Error, Result};
use crate::logging::Verbosity;

pub use commands::{
    CalcCommand, CollectionArg, ConfigCommand, OutputFormat, RecordsCommand, TestTypeArg,
    YearMonth,
};

/// labtest - Field and laboratory calculations for materials testing
///
/// Computes compaction, strength, and sieve results from raw readings and
/// keeps the register of concrete and soil tests.
#[derive(Debug, Parser)]
#[command(name = "labtest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute derived measurements from raw readings
    Calc(CalcCommand),

    /// Register, list, and report test records
    #[command(subcommand)]
    Records(RecordsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Decide whether `records clear` may proceed.
///
/// The user must pass `--yes`. When an administrator code is configured,
/// `code` must match it exactly.
///
/// # Errors
///
/// Returns [`Error::ConfirmationRejected`] describing what is missing.
pub fn authorize_clear(admin: &AdminConfig, yes: bool, code: Option<&str>) -> Result<()> {
    if !yes {
        return Err(Error::ConfirmationRejected(
            "this deletes every record; pass --yes to confirm".to_string(),
        ));
    }

    match (&admin.clear_code, code) {
        (None, _) => Ok(()),
        (Some(expected), Some(given)) if given == expected => Ok(()),
        (Some(_), Some(_)) => Err(Error::ConfirmationRejected(
            "administrator code does not match".to_string(),
        )),
        (Some(_), None) => Err(Error::ConfirmationRejected(
            "an administrator code is required; pass --code".to_string(),
        )),
    }
}
