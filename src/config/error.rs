//! Error types for configuration parsing and validation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::state::DriftReport;

/// Which side of a `[min, max]` range a value fell out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Value is below the minimum.
    Minimum,
    /// Value is above the maximum.
    Maximum,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimum => write!(f, "minimum"),
            Self::Maximum => write!(f, "maximum"),
        }
    }
}

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A numeric field outside its legal bounds.
    Range,
    /// An invariant spanning several fields does not hold.
    CrossField,
    /// A structured string does not match its grammar.
    Parse,
    /// A mode-specific requirement is unmet.
    Prerequisite,
    /// The live configuration differs from the persisted one.
    Drift,
    /// The raw configuration source could not be read.
    Source,
}

/// Error type for configuration operations.
///
/// Covers errors from reading the raw source, assembling the typed record,
/// validating it, and comparing it against the previous run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The raw source names a key this daemon does not know.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// A raw value has the wrong type for its key.
    #[error("Invalid value for {key}: expected {expected}, got '{value}'")]
    InvalidType {
        /// Configuration key
        key: &'static str,
        /// Expected value type
        expected: &'static str,
        /// Raw value as given
        value: String,
    },

    /// A numeric field lies outside its legal range.
    #[error("{field}={value} is out of range: {bound} is {limit}")]
    OutOfRange {
        /// Configuration key of the field
        field: &'static str,
        /// Offending value
        value: String,
        /// Which bound was violated
        bound: Bound,
        /// The bound itself
        limit: String,
    },

    /// The NAT table is larger than both CT tables together.
    #[error(
        "NAT table size ({nat}) must not exceed the combined CT table sizes ({tcp} TCP + {any} any)"
    )]
    NatExceedsConntrack {
        /// NAT entries
        nat: u32,
        /// TCP CT entries
        tcp: u32,
        /// Any-protocol CT entries
        any: u32,
    },

    /// Native routing with masquerading needs a native routing CIDR.
    #[error(
        "native routing cidr must be configured with option --{flag} in combination with \
         --{masquerade_flag}=true --routing-mode=native --ipam={ipam}"
    )]
    MissingNativeRoutingCidr {
        /// Flag that must be provided
        flag: &'static str,
        /// Masquerade flag of the same family
        masquerade_flag: &'static str,
        /// IPAM mode in effect
        ipam: String,
    },

    /// A structured string does not match its grammar.
    #[error("Invalid {field} '{token}': {reason}")]
    Parse {
        /// Configuration key of the field
        field: &'static str,
        /// Offending token or substring
        token: String,
        /// What is wrong with it
        reason: String,
    },

    /// A requirement of the selected mode is unmet.
    #[error("{0}")]
    Prerequisite(String),

    /// The configuration changed in a way a restart cannot absorb.
    #[error("{0}")]
    Drift(DriftReport),

    /// A record could not be encoded for comparison.
    #[error("Failed to encode configuration: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Well-known configuration keys.
///
/// Use these constants for compile-time safety when matching field names.
pub mod key {
    /// Enable IPv4.
    pub const ENABLE_IPV4: &str = "enable-ipv4";
    /// Enable IPv6.
    pub const ENABLE_IPV6: &str = "enable-ipv6";
    /// Enable SCTP.
    pub const ENABLE_SCTP: &str = "enable-sctp";
    /// Masquerade IPv4 traffic leaving the node.
    pub const ENABLE_IPV4_MASQUERADE: &str = "enable-ipv4-masquerade";
    /// Masquerade IPv6 traffic leaving the node.
    pub const ENABLE_IPV6_MASQUERADE: &str = "enable-ipv6-masquerade";
    /// Delegate masquerading decisions to the ip-masq-agent.
    pub const ENABLE_IP_MASQ_AGENT: &str = "enable-ip-masq-agent";
    /// Routing mode (`native` or `tunnel`).
    pub const ROUTING_MODE: &str = "routing-mode";
    /// IPAM mode.
    pub const IPAM: &str = "ipam";
    /// IPv4 native routing prefix.
    pub const IPV4_NATIVE_ROUTING_CIDR: &str = "ipv4-native-routing-cidr";
    /// IPv6 native routing prefix.
    pub const IPV6_NATIVE_ROUTING_CIDR: &str = "ipv6-native-routing-cidr";
    /// IPv6 cluster allocation prefix.
    pub const IPV6_CLUSTER_ALLOC_CIDR: &str = "ipv6-cluster-alloc-cidr";
    /// Local router IPv4 address.
    pub const LOCAL_ROUTER_IPV4: &str = "local-router-ipv4";
    /// Local router IPv6 address.
    pub const LOCAL_ROUTER_IPV6: &str = "local-router-ipv6";
    /// Node health checking.
    pub const ENABLE_HEALTH_CHECKING: &str = "enable-health-checking";
    /// Endpoint health checking.
    pub const ENABLE_ENDPOINT_HEALTH_CHECKING: &str = "enable-endpoint-health-checking";
    /// Envoy configuration subsystem.
    pub const ENABLE_ENVOY_CONFIG: &str = "enable-envoy-config";
    /// Local addresses excluded from the datapath.
    pub const EXCLUDE_LOCAL_ADDRESS: &str = "exclude-local-address";
    /// Reserved local ports for container IPs.
    pub const CONTAINER_IP_LOCAL_RESERVED_PORTS: &str = "container-ip-local-reserved-ports";
    /// Auth table size.
    pub const BPF_AUTH_MAP_MAX: &str = "bpf-auth-map-max";
    /// TCP CT table size.
    pub const BPF_CT_GLOBAL_TCP_MAX: &str = "bpf-ct-global-tcp-max";
    /// Any-protocol CT table size.
    pub const BPF_CT_GLOBAL_ANY_MAX: &str = "bpf-ct-global-any-max";
    /// NAT table size.
    pub const BPF_NAT_GLOBAL_MAX: &str = "bpf-nat-global-max";
    /// Neighbor table size.
    pub const BPF_NEIGH_GLOBAL_MAX: &str = "bpf-neigh-global-max";
    /// Fragment table size.
    pub const BPF_FRAGMENTS_MAP_MAX: &str = "bpf-fragments-map-max";
    /// Per-CPU sharded LRU tables.
    pub const BPF_DISTRIBUTED_LRU: &str = "bpf-distributed-lru";
    /// Share of memory given to planned tables.
    pub const BPF_MAP_DYNAMIC_SIZE_RATIO: &str = "bpf-map-dynamic-size-ratio";
    /// Per-table event buffer settings.
    pub const BPF_MAP_EVENT_BUFFERS: &str = "bpf-map-event-buffers";
    /// Dry-run mode.
    pub const DRY_MODE: &str = "dry-mode";
    /// Interfaces carrying encrypted traffic.
    pub const ENCRYPT_INTERFACE: &str = "encrypt-interface";
    /// Per-endpoint API rate limits.
    pub const API_RATE_LIMIT: &str = "api-rate-limit";

    /// Every key the raw source may contain.
    pub const ALL: &[&str] = &[
        ENABLE_IPV4,
        ENABLE_IPV6,
        ENABLE_SCTP,
        ENABLE_IPV4_MASQUERADE,
        ENABLE_IPV6_MASQUERADE,
        ENABLE_IP_MASQ_AGENT,
        ROUTING_MODE,
        IPAM,
        IPV4_NATIVE_ROUTING_CIDR,
        IPV6_NATIVE_ROUTING_CIDR,
        IPV6_CLUSTER_ALLOC_CIDR,
        LOCAL_ROUTER_IPV4,
        LOCAL_ROUTER_IPV6,
        ENABLE_HEALTH_CHECKING,
        ENABLE_ENDPOINT_HEALTH_CHECKING,
        ENABLE_ENVOY_CONFIG,
        EXCLUDE_LOCAL_ADDRESS,
        CONTAINER_IP_LOCAL_RESERVED_PORTS,
        BPF_AUTH_MAP_MAX,
        BPF_CT_GLOBAL_TCP_MAX,
        BPF_CT_GLOBAL_ANY_MAX,
        BPF_NAT_GLOBAL_MAX,
        BPF_NEIGH_GLOBAL_MAX,
        BPF_FRAGMENTS_MAP_MAX,
        BPF_DISTRIBUTED_LRU,
        BPF_MAP_DYNAMIC_SIZE_RATIO,
        BPF_MAP_EVENT_BUFFERS,
        DRY_MODE,
        ENCRYPT_INTERFACE,
        API_RATE_LIMIT,
    ];
}

impl ConfigError {
    /// Creates a `Parse` error for a field.
    #[must_use]
    pub fn parse(field: &'static str, token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            field,
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `OutOfRange` error.
    #[must_use]
    pub fn out_of_range(
        field: &'static str,
        value: impl fmt::Display,
        bound: Bound,
        limit: impl fmt::Display,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            bound,
            limit: limit.to_string(),
        }
    }

    /// Returns the taxonomy class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. }
            | Self::TomlParse(_)
            | Self::FileWrite { .. }
            | Self::UnknownKey(_)
            | Self::Encode(_) => ErrorKind::Source,
            Self::InvalidType { .. } | Self::Parse { .. } => ErrorKind::Parse,
            Self::OutOfRange { .. } => ErrorKind::Range,
            Self::NatExceedsConntrack { .. } | Self::MissingNativeRoutingCidr { .. } => {
                ErrorKind::CrossField
            }
            Self::Prerequisite(_) => ErrorKind::Prerequisite,
            Self::Drift(_) => ErrorKind::Drift,
        }
    }
}
