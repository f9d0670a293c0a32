//! Default values and static limits for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Smallest entry count accepted for any CT, NAT or neighbor table.
pub const LIMIT_TABLE_MIN: u32 = 1 << 10;

/// Largest entry count accepted for any CT, NAT or neighbor table.
pub const LIMIT_TABLE_MAX: u32 = 1 << 24;

/// Floor for a derived TCP connection-tracking table.
pub const LIMIT_TABLE_AUTO_CT_TCP_MIN: u32 = 1 << 17;

/// Floor for a derived any-protocol connection-tracking table.
pub const LIMIT_TABLE_AUTO_CT_ANY_MIN: u32 = 1 << 16;

/// Floor for a derived NAT table (and the neighbor table that follows it).
pub const LIMIT_TABLE_AUTO_NAT_MIN: u32 = 1 << 17;

/// Static TCP connection-tracking size.
pub const CT_TCP_ENTRIES: u32 = 2 << 18;

/// Static any-protocol connection-tracking size.
pub const CT_ANY_ENTRIES: u32 = 2 << 17;

/// Static NAT size: two thirds of the combined CT capacity.
pub const NAT_ENTRIES: u32 = (CT_TCP_ENTRIES + CT_ANY_ENTRIES) * 2 / 3;

/// Static neighbor size. Kept equal to the NAT size.
pub const NEIGH_ENTRIES: u32 = NAT_ENTRIES;

/// Static socket reverse-NAT size. Only consumes budget, never planned.
pub const SOCK_REV_NAT_ENTRIES: u32 = CT_ANY_ENTRIES;

/// Auth table bounds and default.
pub const AUTH_ENTRIES_MIN: u32 = 1 << 8;
/// Auth table maximum.
pub const AUTH_ENTRIES_MAX: u32 = 1 << 24;
/// Auth table default.
pub const AUTH_ENTRIES: u32 = 1 << 19;

/// Fragment table bounds and default.
pub const FRAGMENTS_ENTRIES_MIN: u32 = 1 << 8;
/// Fragment table maximum.
pub const FRAGMENTS_ENTRIES_MAX: u32 = 1 << 24;
/// Fragment table default.
pub const FRAGMENTS_ENTRIES: u32 = 8192;

/// Default share of system memory given to the planned tables.
pub const DYNAMIC_SIZE_RATIO: f64 = 0.0025;

/// Per-entry byte cost of a CT table (key plus value).
pub const SIZEOF_CT_ELEMENT: u64 = 94;

/// Per-entry byte cost of the NAT table.
pub const SIZEOF_NAT_ELEMENT: u64 = 94;

/// Per-entry byte cost of the neighbor table.
pub const SIZEOF_NEIGH_ELEMENT: u64 = 24;

/// Per-entry byte cost of the socket reverse-NAT table.
pub const SIZEOF_SOCK_REV_NAT_ELEMENT: u64 = 48;

/// Default IPv6 cluster allocation prefix.
pub const IPV6_CLUSTER_ALLOC_CIDR: &str = "f00d::/64";

/// Default reserved local port specification.
pub const RESERVED_PORTS: &str = "auto";

/// Default routing mode.
pub const ROUTING_MODE: &str = "tunnel";

/// Default IPAM mode.
pub const IPAM: &str = "cluster-pool";

/// Name of the snapshot file written to the state directory.
pub const SNAPSHOT_FILE: &str = "daemon-config.json";
