//! File-based snapshot persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{DaemonConfig, defaults};

use super::{LoadResult, SnapshotStore, StateError};

/// Current snapshot file format version.
///
/// Increment this when making breaking changes to the format.
const SNAPSHOT_FILE_VERSION: u32 = 1;

/// On-disk snapshot format.
///
/// Incompatible versions are treated as corrupted; there is no migration.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    /// Format version.
    version: u32,

    /// Unix timestamp when the snapshot was saved. Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,

    /// The validated configuration.
    config: DaemonConfig,
}

impl SnapshotFile {
    fn new(config: &DaemonConfig) -> Self {
        Self {
            version: SNAPSHOT_FILE_VERSION,
            saved_at: Some(unix_timestamp_now()),
            config: config.clone(),
        }
    }
}

fn unix_timestamp_now() -> String {
    use std::time::SystemTime;

    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

/// File-based implementation of [`SnapshotStore`].
///
/// Stores the configuration as pretty-printed JSON with atomic write semantics:
/// 1. Write to `{path}.tmp`
/// 2. Rename `{path}.tmp` to `{path}`
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Creates a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for the default snapshot file inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(defaults::SNAPSHOT_FILE))
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> LoadResult {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadResult::NotFound,
            Err(e) => {
                return LoadResult::Corrupted {
                    reason: format!("Failed to read file: {e}"),
                };
            }
        };

        match serde_json::from_str::<SnapshotFile>(&content) {
            Ok(snapshot) if snapshot.version != SNAPSHOT_FILE_VERSION => LoadResult::Corrupted {
                reason: format!(
                    "Incompatible version: expected {SNAPSHOT_FILE_VERSION}, got {}",
                    snapshot.version
                ),
            },
            Ok(snapshot) => LoadResult::Loaded(Box::new(snapshot.config)),
            Err(e) => LoadResult::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            },
        }
    }

    fn save(&self, config: &DaemonConfig) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(&SnapshotFile::new(config))
            .map_err(StateError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StateError::Write)?;
        }

        // state.json -> state.json.tmp, not state.tmp
        let temp_path = PathBuf::from(format!("{}.tmp", self.path.display()));
        std::fs::write(&temp_path, content).map_err(StateError::Write)?;
        std::fs::rename(&temp_path, &self.path).map_err(StateError::Write)?;

        Ok(())
    }
}
