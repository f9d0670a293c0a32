//! Per-table event buffer settings (`bpf-map-event-buffers`).
//!
//! Each entry is `TABLE=STATE_SIZE_TTL`, e.g. `ct=enabled_1024_1h`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use super::error::key;

/// Event buffer settings for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBufferConfig {
    /// Whether events are buffered at all.
    pub enabled: bool,
    /// Maximum buffered events.
    pub max_size: u32,
    /// How long events are kept.
    pub ttl: Duration,
}

impl EventBufferConfig {
    /// Parses a `STATE_SIZE_TTL` tuple.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the tuple does not have three parts,
    /// the state is not `enabled`/`disabled`, the size is not an integer, or
    /// the TTL is not a duration.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use dpconf::config::EventBufferConfig;
    ///
    /// let config = EventBufferConfig::parse("enabled_123_1h").unwrap();
    /// assert!(config.enabled);
    /// assert_eq!(config.max_size, 123);
    /// assert_eq!(config.ttl, Duration::from_secs(3600));
    /// ```
    pub fn parse(tuple: &str) -> Result<Self, ConfigError> {
        let err = |reason: &str| ConfigError::parse(key::BPF_MAP_EVENT_BUFFERS, tuple, reason);

        let parts: Vec<&str> = tuple.split('_').collect();
        let [state, size, ttl] = parts.as_slice() else {
            return Err(err("expected STATE_SIZE_TTL"));
        };

        let enabled = match *state {
            "enabled" => true,
            "disabled" => false,
            _ => return Err(err("state must be enabled or disabled")),
        };
        let max_size = size
            .parse()
            .map_err(|_| err("size must be an unsigned integer"))?;
        let ttl = humantime::parse_duration(ttl).map_err(|e| err(&e.to_string()))?;

        Ok(Self {
            enabled,
            max_size,
            ttl,
        })
    }
}

/// Parses `TABLE=STATE_SIZE_TTL` entries into a map keyed by table name.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for entries without `=` or with a bad tuple.
pub fn parse_event_buffers<S: AsRef<str>>(
    entries: &[S],
) -> Result<BTreeMap<String, EventBufferConfig>, ConfigError> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            let (table, tuple) = entry.split_once('=').ok_or_else(|| {
                ConfigError::parse(key::BPF_MAP_EVENT_BUFFERS, entry, "expected TABLE=TUPLE")
            })?;
            Ok((table.trim().to_string(), EventBufferConfig::parse(tuple.trim())?))
        })
        .collect()
}
