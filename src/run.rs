//! Application execution logic.
//!
//! This module checks the validated configuration against the snapshot of
//! the previous run and persists it for the next one.

use thiserror::Error;

use dpconf::config::{ConfigError, DaemonConfig, ErrorKind, ValidatedConfig};
use dpconf::state::{DriftDetector, FileSnapshotStore, LoadResult, SnapshotStore, StateError};
use std::process::ExitCode;

use crate::app::exit_code;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration drifted from the previous run.
    #[error("Configuration drift detected. {0}")]
    Drift(#[source] ConfigError),

    /// The configuration could not be compared with the snapshot.
    #[error("Failed to compare configuration with snapshot: {0}")]
    Compare(#[source] ConfigError),

    /// Failed to save the snapshot.
    #[error("Failed to save snapshot: {0}")]
    StateSave(#[source] StateError),
}

impl RunError {
    /// Maps the error to the process exit code.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Drift(_) => exit_code::CONFIG_ERROR,
            Self::Compare(_) | Self::StateSave(_) => exit_code::runtime_error(),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(error: ConfigError) -> Self {
        if error.kind() == ErrorKind::Drift {
            Self::Drift(error)
        } else {
            Self::Compare(error)
        }
    }
}

/// Runtime options extracted from validated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RuntimeOptions {
    dry_run: bool,
    accept_drift: bool,
}

impl From<&ValidatedConfig> for RuntimeOptions {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            accept_drift: config.accept_drift,
        }
    }
}

/// Executes the application.
///
/// Without a state directory there is nothing to compare against, and the
/// validated configuration is only logged.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration drifted and `--accept-drift` was not given
/// - The configuration cannot be encoded for comparison
/// - The snapshot cannot be written
pub fn execute(config: &ValidatedConfig) -> Result<(), RunError> {
    let options = RuntimeOptions::from(config);

    if options.dry_run {
        tracing::info!("Dry-run mode enabled - the snapshot will be checked but not written");
    }

    let Some(ref dir) = config.state_dir else {
        tracing::debug!("No state directory configured, skipping drift detection");
        return Ok(());
    };

    let store = FileSnapshotStore::in_dir(dir);
    tracing::info!("Snapshot persistence enabled: {}", store.path().display());

    reconcile(&store, config.daemon(), &DriftDetector::default(), options)
}

/// Compares the configuration with the stored snapshot and saves it.
fn reconcile(
    store: &impl SnapshotStore,
    current: &DaemonConfig,
    detector: &DriftDetector,
    options: RuntimeOptions,
) -> Result<(), RunError> {
    match store.load() {
        LoadResult::Loaded(persisted) => {
            match detector.validate_unchanged(current, &persisted) {
                Ok(()) => tracing::debug!("Configuration unchanged since last run"),
                Err(e) if options.accept_drift && e.kind() == ErrorKind::Drift => {
                    tracing::warn!("Accepting configuration drift. {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        LoadResult::NotFound => {
            tracing::info!("No previous snapshot found, starting fresh");
        }
        LoadResult::Corrupted { reason } => {
            tracing::warn!("Snapshot corrupted ({reason}), will overwrite");
        }
    }

    if options.dry_run {
        tracing::debug!("Dry-run: skipping snapshot save");
        return Ok(());
    }

    store.save(current).map_err(|e| {
        tracing::error!("Failed to save snapshot: {e}");
        RunError::StateSave(e)
    })
}
