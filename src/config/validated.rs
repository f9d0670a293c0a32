//! The planning and checking pipeline, and the record it produces.
//!
//! A [`ValidatedConfig`] only exists once every table size is final and
//! every range and network check has passed.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::host;
use crate::planner::{ByteBudgetModel, CapacityPlanner};
use crate::validate;

use super::cli::Cli;
use super::daemon::DaemonConfig;
use super::error::ConfigError;
use super::raw::RawConfig;
use super::template::default_config_template;

/// Host facts the planner needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFacts {
    /// Total system memory in bytes. Zero disables dynamic sizing.
    pub total_memory: u64,
    /// Number of CPUs the kernel may bring online.
    pub possible_cpus: u32,
}

impl HostFacts {
    /// Uses the CLI values where given and probes the host for the rest.
    ///
    /// An unreadable memory figure disables dynamic sizing instead of failing.
    #[must_use]
    pub fn resolve(cli: &Cli) -> Self {
        let total_memory = cli.total_memory.unwrap_or_else(|| {
            host::total_memory().unwrap_or_else(|e| {
                tracing::warn!("Cannot read total memory, dynamic table sizing disabled: {e}");
                0
            })
        });
        let possible_cpus = cli.possible_cpus.unwrap_or_else(host::possible_cpus);

        Self {
            total_memory,
            possible_cpus,
        }
    }
}

/// Plans table sizes and validates the record.
///
/// Runs the planner with the record's own size ratio, shrinks a default NAT
/// size to the CT tables, then applies every range and network check.
///
/// # Errors
///
/// Returns the first validation error.
///
/// # Example
///
/// ```
/// use dpconf::config::{DaemonConfig, HostFacts, SizedTable, finalize};
///
/// let host = HostFacts { total_memory: 16 << 30, possible_cpus: 4 };
/// let config = finalize(DaemonConfig::default(), host).unwrap();
///
/// assert_eq!(config.tables.entries(SizedTable::CtTcp), 151_765);
/// ```
pub fn finalize(mut daemon: DaemonConfig, host: HostFacts) -> Result<DaemonConfig, ConfigError> {
    let planner =
        CapacityPlanner::new(ByteBudgetModel::default().with_possible_cpus(host.possible_cpus));
    let ratio = daemon.bpf_map_dynamic_size_ratio;

    planner.plan(&mut daemon, host.total_memory, ratio);
    planner.fit_nat_to_conntrack(&mut daemon);
    validate::check_all(&daemon)?;

    Ok(daemon)
}

/// Daemon record with final table sizes, plus the run flags of the binary.
///
/// Derefs to the validated [`DaemonConfig`], which cannot be modified once
/// constructed.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and a raw source.
#[derive(Debug)]
pub struct ValidatedConfig {
    daemon: DaemonConfig,

    /// Host facts the table sizes were planned with
    pub host: HostFacts,

    /// Directory holding the snapshot of the previous run.
    /// If `None`, drift detection and persistence are disabled.
    pub state_dir: Option<PathBuf>,

    /// Skip writing the snapshot
    pub dry_run: bool,

    /// Overwrite the snapshot even if the configuration drifted
    pub accept_drift: bool,

    /// Debug-level logging requested
    pub verbose: bool,
}

impl Deref for ValidatedConfig {
    type Target = DaemonConfig;

    fn deref(&self) -> &Self::Target {
        &self.daemon
    }
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (memory: {} bytes, cpus: {})",
            self.daemon, self.host.total_memory, self.host.possible_cpus
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and a raw source.
    ///
    /// `--set` overrides from the CLI are applied on top of `raw`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An override is malformed or names an unknown key
    /// - A value does not match its key's type or grammar
    /// - A table size, ratio, or network setting fails validation
    pub fn from_raw(cli: &Cli, mut raw: RawConfig, host: HostFacts) -> Result<Self, ConfigError> {
        for assignment in &cli.overrides {
            raw.apply_override(assignment)?;
        }

        let daemon = finalize(DaemonConfig::from_raw(&raw)?, host)?;

        Ok(Self {
            daemon,
            host,
            state_dir: cli.state_dir.clone(),
            dry_run: cli.dry_run,
            accept_drift: cli.accept_drift,
            verbose: cli.verbose,
        })
    }

    /// Loads the config file named by the CLI, probes the host, and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let raw = match cli.config {
            Some(ref path) => RawConfig::load(path)?,
            None => RawConfig::new(),
        };

        Self::from_raw(cli, raw, HostFacts::resolve(cli))
    }

    /// Returns the validated daemon record.
    #[must_use]
    pub const fn daemon(&self) -> &DaemonConfig {
        &self.daemon
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, default_config_template()).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
