//! Network-shaped configuration values.
//!
//! This module provides types for:
//! - Routing and IPAM modes ([`RoutingMode`], [`IpamMode`])
//! - The IPv6 cluster allocation prefix ([`ClusterAllocCidr`])
//! - Excluded local addresses ([`LocalAddressExclusion`])
//! - Reserved local ports ([`ReservedPorts`])

mod cidr;
mod exclusion;
mod mode;
mod ports;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use cidr::{CLUSTER_ALLOC_PREFIX_LEN, ClusterAllocCidr, parse_ipv4_net, parse_ipv6_net};
pub use exclusion::LocalAddressExclusion;
pub use mode::{IpamMode, RoutingMode};
pub use ports::{PortRange, ReservedPorts};
