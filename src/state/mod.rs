//! Configuration snapshots persisted between daemon runs.
//!
//! This module provides:
//! - Snapshot storage ([`SnapshotStore`], [`FileSnapshotStore`])
//! - Drift detection against the previous run ([`DriftDetector`])

mod drift;
mod file;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use drift::{DriftDetector, DriftPolicy, DriftReport, FieldDrift, Tolerance};
pub use file::FileSnapshotStore;

use std::io;

use thiserror::Error;

use crate::config::DaemonConfig;

/// Outcome of reading the previous run's snapshot.
///
/// Only `Loaded` takes part in drift detection; the other two start the
/// daemon as on a first run.
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Successfully loaded the previously saved configuration.
    Loaded(Box<DaemonConfig>),

    /// No snapshot file exists (first run or explicitly deleted).
    NotFound,

    /// Snapshot file exists but could not be parsed.
    /// The daemon continues as on a first run and overwrites it on save.
    Corrupted {
        /// What made the snapshot unusable.
        reason: String,
    },
}

impl LoadResult {
    /// Returns the loaded configuration, or `None` for `NotFound`/`Corrupted`.
    #[must_use]
    pub fn into_config(self) -> Option<DaemonConfig> {
        match self {
            Self::Loaded(config) => Some(*config),
            Self::NotFound | Self::Corrupted { .. } => None,
        }
    }

    /// Returns `true` if a snapshot was successfully loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Snapshot write failures.
///
/// Read failures never surface as errors; see [`LoadResult`].
#[derive(Debug, Error)]
pub enum StateError {
    /// Failed to write the snapshot file.
    #[error("Failed to write snapshot file: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize the snapshot to JSON.
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Storage for the configuration accepted by the previous run.
///
/// A save must never leave a half-written snapshot behind. A missing
/// snapshot loads as `NotFound`; an unreadable one as `Corrupted`.
pub trait SnapshotStore {
    /// Loads the previously saved configuration.
    fn load(&self) -> LoadResult;

    /// Saves the validated configuration for the next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, config: &DaemonConfig) -> Result<(), StateError>;
}
