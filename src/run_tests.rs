//! Tests for the run module.

use super::*;
use dpconf::config::{Cli, HostFacts, RawConfig};
use tempfile::TempDir;

fn options(dry_run: bool, accept_drift: bool) -> RuntimeOptions {
    RuntimeOptions {
        dry_run,
        accept_drift,
    }
}

fn config_with_dry_mode(dry_mode: bool) -> DaemonConfig {
    DaemonConfig {
        dry_mode,
        ..DaemonConfig::default()
    }
}

mod run_error {
    use super::*;

    #[test]
    fn drift_displays_report() {
        let drift = DriftDetector::default()
            .validate_unchanged(&config_with_dry_mode(true), &config_with_dry_mode(false))
            .unwrap_err();
        let error = RunError::Drift(drift);

        let message = error.to_string();
        assert!(message.starts_with("Configuration drift detected."));
        assert!(message.contains("dry-mode: false -> true"));
    }

    #[test]
    fn state_save_displays_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = RunError::StateSave(StateError::Write(io));
        assert!(error.to_string().contains("Failed to save snapshot"));
    }

    #[test]
    fn exit_codes_differ() {
        let io = std::io::Error::other("disk full");
        let save = RunError::StateSave(StateError::Write(io));
        let drift = RunError::Drift(ConfigError::Prerequisite("x".to_string()));

        assert_eq!(save.exit_code(), exit_code::runtime_error());
        assert_eq!(drift.exit_code(), exit_code::CONFIG_ERROR);
    }

    fn encode_error() -> ConfigError {
        ConfigError::Encode(serde_json::from_str::<u8>("x").unwrap_err())
    }

    #[test]
    fn encode_failure_is_not_drift() {
        let error = RunError::from(encode_error());

        assert!(matches!(error, RunError::Compare(_)));
        assert_eq!(error.exit_code(), exit_code::runtime_error());
        assert!(!error.to_string().contains("drift"));
    }

    #[test]
    fn drift_report_converts_to_drift() {
        let drift = DriftDetector::default()
            .validate_unchanged(&config_with_dry_mode(true), &config_with_dry_mode(false))
            .unwrap_err();

        assert!(matches!(RunError::from(drift), RunError::Drift(_)));
    }
}

mod runtime_options {
    use super::*;

    fn validated(args: &[&str]) -> ValidatedConfig {
        let mut full_args = vec!["dpconf"];
        full_args.extend(args);
        let cli = Cli::parse_from_iter(full_args);
        let host = HostFacts {
            total_memory: 0,
            possible_cpus: 1,
        };
        ValidatedConfig::from_raw(&cli, RawConfig::new(), host).unwrap()
    }

    #[test]
    fn from_config_extracts_flags() {
        let config = validated(&["--dry-run", "--accept-drift"]);
        assert_eq!(RuntimeOptions::from(&config), options(true, true));
    }

    #[test]
    fn defaults_when_not_specified() {
        let config = validated(&[]);
        assert_eq!(RuntimeOptions::from(&config), options(false, false));
    }

    #[test]
    fn execute_without_state_dir_succeeds() {
        let config = validated(&[]);
        assert!(execute(&config).is_ok());
    }

    #[test]
    fn execute_writes_snapshot_into_state_dir() {
        let dir = TempDir::new().unwrap();
        let config = validated(&["--state-dir", dir.path().to_str().unwrap()]);

        execute(&config).unwrap();

        let store = FileSnapshotStore::in_dir(dir.path());
        assert_eq!(store.load().into_config().as_ref(), Some(config.daemon()));
    }
}

mod reconcile {
    use super::*;

    fn store_with(config: &DaemonConfig) -> (TempDir, FileSnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        store.save(config).unwrap();
        (dir, store)
    }

    #[test]
    fn first_run_saves_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        let current = DaemonConfig::default();

        reconcile(&store, &current, &DriftDetector::default(), options(false, false)).unwrap();

        assert_eq!(store.load().into_config(), Some(current));
    }

    #[test]
    fn unchanged_config_passes() {
        let current = DaemonConfig::default();
        let (_dir, store) = store_with(&current);

        let result = reconcile(&store, &current, &DriftDetector::default(), options(false, false));

        assert!(result.is_ok());
    }

    #[test]
    fn drift_is_fatal_and_keeps_old_snapshot() {
        let (_dir, store) = store_with(&config_with_dry_mode(false));

        let result = reconcile(
            &store,
            &config_with_dry_mode(true),
            &DriftDetector::default(),
            options(false, false),
        );

        assert!(matches!(result, Err(RunError::Drift(_))));
        assert_eq!(store.load().into_config(), Some(config_with_dry_mode(false)));
    }

    #[test]
    fn accepted_drift_overwrites_snapshot() {
        let (_dir, store) = store_with(&config_with_dry_mode(false));

        reconcile(
            &store,
            &config_with_dry_mode(true),
            &DriftDetector::default(),
            options(false, true),
        )
        .unwrap();

        assert_eq!(store.load().into_config(), Some(config_with_dry_mode(true)));
    }

    #[test]
    fn dry_run_checks_but_does_not_save() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());

        reconcile(
            &store,
            &DaemonConfig::default(),
            &DriftDetector::default(),
            options(true, false),
        )
        .unwrap();

        assert!(matches!(store.load(), LoadResult::NotFound));
    }

    #[test]
    fn dry_run_still_reports_drift() {
        let (_dir, store) = store_with(&config_with_dry_mode(false));

        let result = reconcile(
            &store,
            &config_with_dry_mode(true),
            &DriftDetector::default(),
            options(true, false),
        );

        assert!(matches!(result, Err(RunError::Drift(_))));
    }

    #[test]
    fn corrupted_snapshot_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::in_dir(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        reconcile(
            &store,
            &DaemonConfig::default(),
            &DriftDetector::default(),
            options(false, false),
        )
        .unwrap();

        assert!(store.load().is_loaded());
    }
}
