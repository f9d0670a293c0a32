//! Validation of an assembled [`DaemonConfig`].
//!
//! Every check is a pure predicate over the record and returns the first
//! violation it finds. Nothing here mutates the record or logs.
//!
//! Table sizes must be final before [`check_ranges`] runs: the NAT capacity
//! check compares derived values.

mod network;
mod ranges;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use network::{
    check_ipam_delegated_plugin, check_ipv4_native_routing_cidr, check_ipv6_cluster_alloc_cidr,
    check_ipv6_native_routing_cidr, check_network,
};
pub use ranges::{check_nat_capacity, check_ranges, check_table};

use crate::config::{ConfigError, DaemonConfig};

/// Runs every range and network check in order.
///
/// # Errors
///
/// Returns the first violation found.
pub fn check_all(config: &DaemonConfig) -> Result<(), ConfigError> {
    check_ranges(config)?;
    check_network(config)
}
