//! Tests for snapshot persistence and drift detection.

use tempfile::TempDir;

use crate::config::{ConfigError, DaemonConfig, ErrorKind, TableSize};
use crate::state::mock::MockSnapshotStore;
use crate::state::{
    DriftDetector, DriftPolicy, FileSnapshotStore, LoadResult, SnapshotStore, Tolerance,
};

fn populated() -> DaemonConfig {
    let mut config = DaemonConfig {
        enable_ipv6: true,
        encrypt_interface: vec!["eth0".to_string(), "eth1".to_string()],
        ..DaemonConfig::default()
    };
    config.tables.ct_tcp = TableSize::explicit(1 << 20);
    config.opts.insert("debug".to_string(), true);
    config
}

mod load_result {
    use super::*;

    #[test]
    fn into_config_returns_loaded_data() {
        let result = LoadResult::Loaded(Box::new(populated()));
        assert_eq!(result.into_config(), Some(populated()));
    }

    #[test]
    fn into_config_returns_none_for_not_found() {
        assert!(LoadResult::NotFound.into_config().is_none());
    }

    #[test]
    fn into_config_returns_none_for_corrupted() {
        let result = LoadResult::Corrupted {
            reason: "test".to_string(),
        };
        assert!(result.into_config().is_none());
    }

    #[test]
    fn is_loaded_only_for_loaded() {
        assert!(LoadResult::Loaded(Box::default()).is_loaded());
        assert!(!LoadResult::NotFound.is_loaded());
        assert!(
            !LoadResult::Corrupted {
                reason: "test".to_string()
            }
            .is_loaded()
        );
    }
}

mod file_snapshot_store {
    use super::*;

    #[test]
    fn load_returns_not_found_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());

        assert!(matches!(store.load(), LoadResult::NotFound));
    }

    #[test]
    fn save_then_load_returns_same_config() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        let config = populated();

        store.save(&config).unwrap();

        assert_eq!(store.load().into_config(), Some(config));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested/deeper/snapshot.json"));

        store.save(&DaemonConfig::default()).unwrap();

        assert!(store.path().exists());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());

        store.save(&DaemonConfig::default()).unwrap();

        let temp = format!("{}.tmp", store.path().display());
        assert!(!std::path::Path::new(&temp).exists());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());

        store.save(&DaemonConfig::default()).unwrap();
        store.save(&populated()).unwrap();

        assert_eq!(store.load().into_config(), Some(populated()));
    }

    #[test]
    fn invalid_json_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        match store.load() {
            LoadResult::Corrupted { reason } => assert!(reason.contains("Invalid JSON")),
            other => panic!("expected Corrupted, got {other:?}"),
        }
    }

    #[test]
    fn wrong_version_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        store.save(&DaemonConfig::default()).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        std::fs::write(store.path(), content.replace("\"version\": 1", "\"version\": 99")).unwrap();

        match store.load() {
            LoadResult::Corrupted { reason } => assert!(reason.contains("Incompatible version")),
            other => panic!("expected Corrupted, got {other:?}"),
        }
    }
}

mod mock_store {
    use super::*;

    #[test]
    fn records_saved_config() {
        let store = MockSnapshotStore::not_found();
        assert!(store.saved().is_none());

        store.save(&populated()).unwrap();

        assert_eq!(store.saved(), Some(populated()));
    }

    #[test]
    fn returns_injected_load_result() {
        assert!(MockSnapshotStore::with_loaded(populated()).load().is_loaded());
        assert!(matches!(
            MockSnapshotStore::corrupted("bad").load(),
            LoadResult::Corrupted { .. }
        ));
    }
}

mod drift {
    use super::*;

    fn drifted_fields(current: &DaemonConfig, persisted: &DaemonConfig) -> Vec<String> {
        DriftDetector::default()
            .diff(current, persisted)
            .unwrap()
            .field_names()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn identical_configs_pass() {
        let detector = DriftDetector::default();
        assert!(detector.validate_unchanged(&populated(), &populated()).is_ok());
    }

    #[test]
    fn dry_mode_change_is_drift() {
        let persisted = populated();
        let current = DaemonConfig {
            dry_mode: true,
            ..populated()
        };

        let err = DriftDetector::default()
            .validate_unchanged(&current, &persisted)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Drift);
        assert!(err.to_string().contains("Config differs:"));
        assert!(err.to_string().contains("dry-mode: false -> true"));
    }

    #[test]
    fn appending_encrypt_interface_is_accepted() {
        let persisted = populated();
        let mut current = populated();
        current.encrypt_interface.push("yolo".to_string());

        assert!(
            DriftDetector::default()
                .validate_unchanged(&current, &persisted)
                .is_ok()
        );
    }

    #[test]
    fn removing_encrypt_interface_is_drift() {
        let persisted = populated();
        let mut current = populated();
        current.encrypt_interface.pop();

        assert_eq!(drifted_fields(&current, &persisted), ["encrypt-interface"]);
    }

    #[test]
    fn reordering_encrypt_interface_is_drift() {
        let persisted = populated();
        let mut current = populated();
        current.encrypt_interface.reverse();

        assert_eq!(drifted_fields(&current, &persisted), ["encrypt-interface"]);
    }

    #[test]
    fn option_overlay_is_ignored() {
        let persisted = populated();
        let mut current = populated();
        current.opts.insert("debug".to_string(), false);
        current.opts.insert("unit-test-key-only".to_string(), true);

        assert!(drifted_fields(&current, &persisted).is_empty());
    }

    #[test]
    fn nested_fields_reported_by_path() {
        let persisted = populated();
        let mut current = populated();
        current.tables.ct_tcp = TableSize::explicit(1 << 21);

        assert_eq!(
            drifted_fields(&current, &persisted),
            ["tables.ct-tcp.entries"]
        );
    }

    #[test]
    fn every_differing_field_is_listed() {
        let persisted = populated();
        let current = DaemonConfig {
            dry_mode: true,
            enable_sctp: true,
            ..populated()
        };

        let err = DriftDetector::default()
            .validate_unchanged(&current, &persisted)
            .unwrap_err();
        let ConfigError::Drift(report) = err else {
            panic!("expected drift");
        };

        assert_eq!(report.fields.len(), 2);
        assert_eq!(
            report.field_names().collect::<Vec<_>>(),
            ["dry-mode", "enable-sctp"]
        );
        assert_eq!(report.fields[1].before, "false");
        assert_eq!(report.fields[1].after, "true");
    }

    #[test]
    fn strict_policy_flags_overlay_changes() {
        let persisted = populated();
        let mut current = populated();
        current.opts.clear();

        let detector = DriftDetector::new(DriftPolicy::strict());
        assert!(detector.validate_unchanged(&current, &persisted).is_err());
    }

    #[test]
    fn unordered_policy_accepts_reordering_only() {
        let detector = DriftDetector::new(
            DriftPolicy::default().with("encrypt-interface", Tolerance::Unordered),
        );
        let persisted = populated();

        let mut reordered = populated();
        reordered.encrypt_interface.reverse();
        assert!(detector.validate_unchanged(&reordered, &persisted).is_ok());

        let mut appended = populated();
        appended.encrypt_interface.push("eth2".to_string());
        assert!(detector.validate_unchanged(&appended, &persisted).is_err());
    }

    #[test]
    fn ignored_parent_covers_nested_fields() {
        let detector = DriftDetector::new(DriftPolicy::default().with("tables", Tolerance::Ignore));
        let persisted = populated();
        let mut current = populated();
        current.tables.nat = TableSize::explicit(4096);

        assert!(detector.validate_unchanged(&current, &persisted).is_ok());
    }

    #[test]
    fn tolerance_lookup_walks_up_paths() {
        let policy = DriftPolicy::strict().with("tables", Tolerance::Ignore);

        assert_eq!(policy.tolerance("tables.nat.entries"), Tolerance::Ignore);
        assert_eq!(policy.tolerance("dry-mode"), Tolerance::Strict);
    }
}
