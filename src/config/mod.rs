//! Configuration layer for the data-plane daemon.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - The raw key/value source ([`RawConfig`])
//! - The typed daemon record ([`DaemonConfig`]) and its sized tables ([`TableSizes`])
//! - Validated configuration ([`ValidatedConfig`], [`finalize`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values and static limits ([`defaults`])
//!
//! # Priority
//!
//! Raw values are resolved with the following priority (highest to lowest):
//!
//! 1. **`--set KEY=VALUE` overrides** - always stored as strings and coerced on read
//! 2. **TOML config file** - a flat table of kebab-case keys
//! 3. **Built-in defaults** - see [`defaults`]
//!
//! Unknown keys are rejected in both sources.
//!
//! # Table Sizes
//!
//! A sized-table key is either absent (static default, may be replaced by
//! dynamic sizing), the string `"auto"` (always derived), or an explicit
//! entry count. Explicit counts are never changed; they are only range
//! checked, and may go below the floor applied to derived sizes.
//!
//! # Pipeline
//!
//! [`DaemonConfig::from_raw`] checks per-field grammar. [`finalize`] then
//! plans table sizes and runs every cross-field check. The result is
//! immutable behind [`ValidatedConfig`].

mod cli;
mod daemon;
pub mod defaults;
mod error;
mod event_buffer;
mod raw;
mod table;
mod template;
mod validated;


pub use cli::{Cli, Command};
pub use daemon::DaemonConfig;
pub use error::{Bound, ConfigError, ErrorKind, key};
pub use event_buffer::{EventBufferConfig, parse_event_buffers};
pub use raw::{RawConfig, RawValue};
pub use table::{SizeOrigin, SizedTable, TableLimits, TableSize, TableSizes};
pub use template::default_config_template;
pub use validated::{HostFacts, ValidatedConfig, finalize, write_default_config};
