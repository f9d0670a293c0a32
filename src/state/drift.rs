//! Restart-time comparison of the live configuration against the persisted one.
//!
//! Both records are encoded as JSON values and walked field by field. Nested
//! objects are compared per sub-field, so a change is reported with a dotted
//! path such as `tables.ct-tcp.entries`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{Map, Value};

use crate::config::{ConfigError, DaemonConfig, key};

/// How a field may change between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// Any change is drift.
    #[default]
    Strict,
    /// Changes are never drift.
    Ignore,
    /// A list may gain entries at its end. Removing or reordering is drift.
    AppendOnly,
    /// A list may be reordered. Adding or removing entries is drift.
    Unordered,
}

/// Per-field drift tolerances. Fields without an entry are [`Tolerance::Strict`].
///
/// Fields are named by their serialized (kebab-case) path. A nested field
/// inherits the tolerance of its closest configured ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftPolicy {
    fields: BTreeMap<String, Tolerance>,
}

impl Default for DriftPolicy {
    /// The runtime option overlay is ignored; encryption interfaces may be appended.
    fn default() -> Self {
        Self::strict()
            .with("opts", Tolerance::Ignore)
            .with(key::ENCRYPT_INTERFACE, Tolerance::AppendOnly)
    }
}

impl DriftPolicy {
    /// A policy that treats every change as drift.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Sets the tolerance of one field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, tolerance: Tolerance) -> Self {
        self.fields.insert(field.into(), tolerance);
        self
    }

    /// Returns the tolerance in effect for a dotted field path.
    #[must_use]
    pub fn tolerance(&self, path: &str) -> Tolerance {
        let mut candidate = path;
        loop {
            if let Some(tolerance) = self.fields.get(candidate) {
                return *tolerance;
            }
            match candidate.rsplit_once('.') {
                Some((parent, _)) => candidate = parent,
                None => return Tolerance::Strict,
            }
        }
    }
}

/// One field that differs between two runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDrift {
    /// Dotted field path.
    pub field: String,
    /// Persisted value, JSON-encoded. `null` if the field was absent.
    pub before: String,
    /// Live value, JSON-encoded. `null` if the field is absent.
    pub after: String,
}

/// Every field that drifted, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DriftReport {
    /// Differing fields.
    pub fields: Vec<FieldDrift>,
}

impl DriftReport {
    /// Returns true if nothing drifted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the paths of the drifted fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|drift| drift.field.as_str())
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Config differs:")?;
        for drift in &self.fields {
            write!(f, "\n  {}: {} -> {}", drift.field, drift.before, drift.after)?;
        }
        Ok(())
    }
}

/// Compares configuration records under a [`DriftPolicy`].
///
/// # Example
///
/// ```
/// use dpconf::config::DaemonConfig;
/// use dpconf::state::DriftDetector;
///
/// let persisted = DaemonConfig::default();
/// let mut current = persisted.clone();
/// current.encrypt_interface.push("eth1".to_string());
///
/// let detector = DriftDetector::default();
/// assert!(detector.validate_unchanged(&current, &persisted).is_ok());
///
/// current.dry_mode = true;
/// let err = detector.validate_unchanged(&current, &persisted).unwrap_err();
/// assert!(err.to_string().starts_with("Config differs:"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DriftDetector {
    policy: DriftPolicy,
}

impl DriftDetector {
    /// Creates a detector with the given policy.
    #[must_use]
    pub const fn new(policy: DriftPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy in use.
    #[must_use]
    pub const fn policy(&self) -> &DriftPolicy {
        &self.policy
    }

    /// Checks that `current` only differs from `persisted` where the policy allows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Drift`] listing every differing field, or
    /// [`ConfigError::Encode`] if a record cannot be encoded.
    pub fn validate_unchanged(
        &self,
        current: &DaemonConfig,
        persisted: &DaemonConfig,
    ) -> Result<(), ConfigError> {
        let report = self.diff(current, persisted)?;
        if report.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Drift(report))
        }
    }

    /// Lists every field that differs beyond its tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] if a record cannot be encoded.
    pub fn diff(
        &self,
        current: &DaemonConfig,
        persisted: &DaemonConfig,
    ) -> Result<DriftReport, ConfigError> {
        let after = serde_json::to_value(current).map_err(ConfigError::Encode)?;
        let before = serde_json::to_value(persisted).map_err(ConfigError::Encode)?;

        let mut report = DriftReport::default();
        match (&before, &after) {
            (Value::Object(before), Value::Object(after)) => {
                self.compare_objects("", before, after, &mut report);
            }
            _ => self.compare("", &before, &after, &mut report),
        }
        Ok(report)
    }

    fn compare_objects(
        &self,
        prefix: &str,
        before: &Map<String, Value>,
        after: &Map<String, Value>,
        report: &mut DriftReport,
    ) {
        let fields: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        for field in fields {
            let path = if prefix.is_empty() {
                field.clone()
            } else {
                format!("{prefix}.{field}")
            };
            let before = before.get(field).unwrap_or(&Value::Null);
            let after = after.get(field).unwrap_or(&Value::Null);
            self.compare(&path, before, after, report);
        }
    }

    fn compare(&self, path: &str, before: &Value, after: &Value, report: &mut DriftReport) {
        let tolerance = self.policy.tolerance(path);
        if let (Tolerance::Strict, Value::Object(before), Value::Object(after)) =
            (tolerance, before, after)
        {
            self.compare_objects(path, before, after, report);
            return;
        }

        if !within_tolerance(tolerance, before, after) {
            report.fields.push(FieldDrift {
                field: path.to_string(),
                before: before.to_string(),
                after: after.to_string(),
            });
        }
    }
}

fn within_tolerance(tolerance: Tolerance, before: &Value, after: &Value) -> bool {
    match (tolerance, before, after) {
        (Tolerance::Ignore, _, _) => true,
        (Tolerance::AppendOnly, Value::Array(before), Value::Array(after)) => {
            after.starts_with(before)
        }
        (Tolerance::Unordered, Value::Array(before), Value::Array(after)) => {
            before.len() == after.len() && sorted(before) == sorted(after)
        }
        _ => before == after,
    }
}

fn sorted(values: &[Value]) -> Vec<String> {
    let mut encoded: Vec<String> = values.iter().map(Value::to_string).collect();
    encoded.sort_unstable();
    encoded
}
