//! Raw key/value configuration source.
//!
//! The daemon reads a flat table of kebab-case keys. Values come from a TOML
//! file and from `--set KEY=VALUE` overrides; both land in one [`RawConfig`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use super::error::key;
use super::table::{SizedTable, TableSize};

/// A single raw value as read from the source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value. CLI overrides always arrive as strings.
    Str(String),
    /// List of strings.
    List(Vec<String>),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Fully merged key/value configuration.
///
/// Only keys listed in [`key::ALL`] are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    values: BTreeMap<String, RawValue>,
}

impl RawConfig {
    /// Creates an empty source; every key falls back to its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a flat TOML table from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an unknown key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses a flat TOML table.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or names an unknown key.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let values: BTreeMap<String, RawValue> = toml::from_str(content)?;
        let mut raw = Self::new();
        for (name, value) in values {
            raw.insert(&name, value)?;
        }
        Ok(raw)
    }

    /// Sets a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] if the key is not recognized.
    pub fn insert(&mut self, name: &str, value: RawValue) -> Result<(), ConfigError> {
        if !key::ALL.contains(&name) {
            return Err(ConfigError::UnknownKey(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Applies a `KEY=VALUE` override. The value is stored as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the override has no `=` or names an unknown key.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            ConfigError::parse("override", assignment, "expected KEY=VALUE")
        })?;
        self.insert(name.trim(), RawValue::Str(value.trim().to_string()))
    }

    /// Builder-style variant of [`RawConfig::insert`] for keys known to be valid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] if the key is not recognized.
    pub fn with(mut self, name: &str, value: RawValue) -> Result<Self, ConfigError> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Reads a boolean, accepting `true`/`false` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for any other value.
    pub fn bool_or(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(RawValue::Bool(b)) => Ok(*b),
            Some(RawValue::Str(s)) => s
                .parse()
                .map_err(|_| invalid(name, "a boolean", s)),
            Some(other) => Err(invalid(name, "a boolean", other)),
        }
    }

    /// Reads a non-negative integer that fits in `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for anything else.
    pub fn u32_opt(&self, name: &'static str) -> Result<Option<u32>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(RawValue::Int(i)) => u32::try_from(*i)
                .map(Some)
                .map_err(|_| invalid(name, "an unsigned integer", i)),
            Some(RawValue::Str(s)) => s
                .parse()
                .map(Some)
                .map_err(|_| invalid(name, "an unsigned integer", s)),
            Some(other) => Err(invalid(name, "an unsigned integer", other)),
        }
    }

    /// Reads a floating point number. Integers are widened.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for anything else.
    #[allow(clippy::cast_precision_loss)] // config integers are far below 2^52
    pub fn f64_or(&self, name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(RawValue::Float(v)) => Ok(*v),
            Some(RawValue::Int(i)) => Ok(*i as f64),
            Some(RawValue::Str(s)) => s.parse().map_err(|_| invalid(name, "a number", s)),
            Some(other) => Err(invalid(name, "a number", other)),
        }
    }

    /// Reads a string. Absent keys yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for lists.
    pub fn str_opt(&self, name: &'static str) -> Result<Option<String>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(RawValue::List(items)) => Err(invalid(name, "a string", items.join(","))),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    /// Reads a string with a default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for lists.
    pub fn str_or(&self, name: &'static str, default: &str) -> Result<String, ConfigError> {
        Ok(self
            .str_opt(name)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Reads a string list. A plain string is split on commas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] for booleans and numbers.
    pub fn list(&self, name: &'static str) -> Result<Vec<String>, ConfigError> {
        match self.values.get(name) {
            None => Ok(Vec::new()),
            Some(RawValue::List(items)) => Ok(items.clone()),
            Some(RawValue::Str(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()),
            Some(other) => Err(invalid(name, "a list of strings", other)),
        }
    }

    /// Reads a table size: absent is unset, `"auto"` asks for derivation,
    /// anything else must be an explicit entry count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] if the value is neither `auto` nor an integer.
    pub fn table_size(&self, table: SizedTable) -> Result<TableSize, ConfigError> {
        let name = table.key();
        let default = table.limits().default;
        match self.values.get(name) {
            None => Ok(TableSize::unset(default)),
            Some(RawValue::Str(s)) if s.eq_ignore_ascii_case("auto") => {
                Ok(TableSize::auto(default))
            }
            Some(_) => {
                let entries = self.u32_opt(name)?.unwrap_or(default);
                Ok(TableSize::explicit(entries))
            }
        }
    }
}

fn invalid(key: &'static str, expected: &'static str, value: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidType {
        key,
        expected,
        value: value.to_string(),
    }
}
