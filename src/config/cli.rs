//! Command-line flags of the `dpconf` binary.
//!
//! Configuration keys themselves are not flags; they come from the config
//! file or from repeated `--set KEY=VALUE` overrides.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dpconf: data-plane daemon configuration validator
///
/// Assembles the daemon configuration, sizes kernel tables from the memory
/// budget, validates the result and checks it against the previous run.
#[derive(Debug, Parser)]
#[command(name = "dpconf")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand; validation runs when none is given
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file (flat TOML table of kebab-case keys)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Override a configuration key (can be specified multiple times)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Total system memory in bytes (default: read from the host)
    #[arg(long = "total-memory", value_name = "BYTES")]
    pub total_memory: Option<u64>,

    /// Number of possible CPUs (default: read from the host)
    #[arg(long = "possible-cpus", value_parser = clap::value_parser!(u32).range(1..))]
    pub possible_cpus: Option<u32>,

    /// Directory holding the configuration snapshot of the previous run
    #[arg(long = "state-dir")]
    pub state_dir: Option<PathBuf>,

    /// Validate and check drift without writing a new snapshot
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite the snapshot even if the configuration drifted
    #[arg(long)]
    pub accept_drift: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for dpconf
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a commented template listing every configuration key
    Init {
        /// Where to write the template
        #[arg(long, short, default_value = "dpconf.toml")]
        output: PathBuf,
    },

    /// Validate an `api-rate-limit` value and print the parsed policies
    CheckRateLimit {
        /// Flat policy string or JSON object
        value: String,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
