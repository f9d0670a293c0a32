//! The typed daemon configuration record.
//!
//! Assembled once from a [`RawConfig`]. Structured strings (prefixes, port
//! specs, policy maps, event buffer tuples) are parsed during assembly so the
//! record only ever holds well-formed values; cross-field checks run later in
//! [`crate::validate`].

use std::collections::BTreeMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::network::{
    ClusterAllocCidr, IpamMode, LocalAddressExclusion, ReservedPorts, RoutingMode,
    parse_ipv4_net, parse_ipv6_net,
};
use crate::policy::PolicyMap;

use super::ConfigError;
use super::defaults;
use super::error::key;
use super::event_buffer::{EventBufferConfig, parse_event_buffers};
use super::raw::RawConfig;
use super::table::{SizedTable, TableSizes};

/// Full set of daemon parameters.
///
/// Serialized as the persisted snapshot used for drift detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(clippy::struct_excessive_bools)] // feature toggles are naturally boolean
pub struct DaemonConfig {
    /// IPv4 datapath enabled.
    pub enable_ipv4: bool,
    /// IPv6 datapath enabled.
    pub enable_ipv6: bool,
    /// SCTP handling enabled.
    pub enable_sctp: bool,
    /// Masquerade IPv4 traffic leaving the node.
    pub enable_ipv4_masquerade: bool,
    /// Masquerade IPv6 traffic leaving the node.
    pub enable_ipv6_masquerade: bool,
    /// Masquerading decisions are delegated to the ip-masq-agent.
    pub enable_ip_masq_agent: bool,
    /// Routing mode.
    pub routing_mode: RoutingMode,
    /// IPAM backend.
    pub ipam: IpamMode,
    /// Prefix reachable without masquerading in native routing mode (IPv4).
    pub ipv4_native_routing_cidr: Option<Ipv4Net>,
    /// Prefix reachable without masquerading in native routing mode (IPv6).
    pub ipv6_native_routing_cidr: Option<Ipv6Net>,
    /// IPv6 cluster allocation block. Only parsed when IPv6 is enabled.
    pub ipv6_cluster_alloc_cidr: Option<ClusterAllocCidr>,
    /// Router address used by a delegated IPAM plugin (IPv4).
    pub local_router_ipv4: Option<Ipv4Addr>,
    /// Router address used by a delegated IPAM plugin (IPv6).
    pub local_router_ipv6: Option<Ipv6Addr>,
    /// Node health checking.
    pub enable_health_checking: bool,
    /// Endpoint health checking.
    pub enable_endpoint_health_checking: bool,
    /// Envoy configuration subsystem.
    pub enable_envoy_config: bool,
    /// Local addresses left alone by the datapath.
    pub exclude_local_address: LocalAddressExclusion,
    /// Reserved local ports on container IPs.
    pub container_ip_local_reserved_ports: ReservedPorts,
    /// Sized kernel tables.
    pub tables: TableSizes,
    /// LRU tables are sharded per CPU.
    pub bpf_distributed_lru: bool,
    /// Share of system memory given to planned tables.
    pub bpf_map_dynamic_size_ratio: f64,
    /// Event buffer settings per table.
    pub bpf_map_event_buffers: BTreeMap<String, EventBufferConfig>,
    /// Dry-run mode: compute everything, touch nothing.
    pub dry_mode: bool,
    /// Interfaces carrying encrypted traffic.
    pub encrypt_interface: Vec<String>,
    /// Per-endpoint API rate limits.
    pub api_rate_limit: PolicyMap,
    /// Runtime option overlay. Changes freely between runs.
    #[serde(default)]
    pub opts: BTreeMap<String, bool>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            enable_ipv4: true,
            enable_ipv6: false,
            enable_sctp: false,
            enable_ipv4_masquerade: true,
            enable_ipv6_masquerade: true,
            enable_ip_masq_agent: false,
            routing_mode: RoutingMode::Tunnel,
            ipam: IpamMode::ClusterPool,
            ipv4_native_routing_cidr: None,
            ipv6_native_routing_cidr: None,
            ipv6_cluster_alloc_cidr: None,
            local_router_ipv4: None,
            local_router_ipv6: None,
            enable_health_checking: true,
            enable_endpoint_health_checking: true,
            enable_envoy_config: false,
            exclude_local_address: LocalAddressExclusion::default(),
            container_ip_local_reserved_ports: ReservedPorts::Auto,
            tables: TableSizes::default(),
            bpf_distributed_lru: false,
            bpf_map_dynamic_size_ratio: defaults::DYNAMIC_SIZE_RATIO,
            bpf_map_event_buffers: BTreeMap::new(),
            dry_mode: false,
            encrypt_interface: Vec::new(),
            api_rate_limit: PolicyMap::default(),
            opts: BTreeMap::new(),
        }
    }
}

impl DaemonConfig {
    /// Assembles the record from a merged raw source.
    ///
    /// Missing keys take their defaults. Only per-field grammar is checked
    /// here; cross-field invariants are left to [`crate::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A value has the wrong type for its key
    /// - A mode name is unknown
    /// - A prefix, address, port spec, policy map or event buffer tuple is malformed
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        let base = Self::default();
        let enable_ipv6 = raw.bool_or(key::ENABLE_IPV6, base.enable_ipv6)?;

        Ok(Self {
            enable_ipv4: raw.bool_or(key::ENABLE_IPV4, base.enable_ipv4)?,
            enable_ipv6,
            enable_sctp: raw.bool_or(key::ENABLE_SCTP, base.enable_sctp)?,
            enable_ipv4_masquerade: raw
                .bool_or(key::ENABLE_IPV4_MASQUERADE, base.enable_ipv4_masquerade)?,
            enable_ipv6_masquerade: raw
                .bool_or(key::ENABLE_IPV6_MASQUERADE, base.enable_ipv6_masquerade)?,
            enable_ip_masq_agent: raw.bool_or(key::ENABLE_IP_MASQ_AGENT, base.enable_ip_masq_agent)?,
            routing_mode: parse_mode(raw, key::ROUTING_MODE, defaults::ROUTING_MODE)?,
            ipam: parse_mode(raw, key::IPAM, defaults::IPAM)?,
            ipv4_native_routing_cidr: parse_ipv4_net(
                key::IPV4_NATIVE_ROUTING_CIDR,
                &raw.str_or(key::IPV4_NATIVE_ROUTING_CIDR, "")?,
            )?,
            ipv6_native_routing_cidr: parse_ipv6_net(
                key::IPV6_NATIVE_ROUTING_CIDR,
                &raw.str_or(key::IPV6_NATIVE_ROUTING_CIDR, "")?,
            )?,
            ipv6_cluster_alloc_cidr: if enable_ipv6 {
                Some(ClusterAllocCidr::parse(&raw.str_or(
                    key::IPV6_CLUSTER_ALLOC_CIDR,
                    defaults::IPV6_CLUSTER_ALLOC_CIDR,
                )?)?)
            } else {
                None
            },
            local_router_ipv4: parse_addr(raw, key::LOCAL_ROUTER_IPV4)?,
            local_router_ipv6: parse_addr(raw, key::LOCAL_ROUTER_IPV6)?,
            enable_health_checking: raw
                .bool_or(key::ENABLE_HEALTH_CHECKING, base.enable_health_checking)?,
            enable_endpoint_health_checking: raw.bool_or(
                key::ENABLE_ENDPOINT_HEALTH_CHECKING,
                base.enable_endpoint_health_checking,
            )?,
            enable_envoy_config: raw.bool_or(key::ENABLE_ENVOY_CONFIG, base.enable_envoy_config)?,
            exclude_local_address: LocalAddressExclusion::parse(
                &raw.list(key::EXCLUDE_LOCAL_ADDRESS)?,
            )?,
            container_ip_local_reserved_ports: ReservedPorts::parse(&raw.str_or(
                key::CONTAINER_IP_LOCAL_RESERVED_PORTS,
                defaults::RESERVED_PORTS,
            )?)?,
            tables: Self::read_tables(raw)?,
            bpf_distributed_lru: raw.bool_or(key::BPF_DISTRIBUTED_LRU, base.bpf_distributed_lru)?,
            bpf_map_dynamic_size_ratio: raw
                .f64_or(key::BPF_MAP_DYNAMIC_SIZE_RATIO, base.bpf_map_dynamic_size_ratio)?,
            bpf_map_event_buffers: parse_event_buffers(&raw.list(key::BPF_MAP_EVENT_BUFFERS)?)?,
            dry_mode: raw.bool_or(key::DRY_MODE, base.dry_mode)?,
            encrypt_interface: raw.list(key::ENCRYPT_INTERFACE)?,
            api_rate_limit: PolicyMap::parse(&raw.str_or(key::API_RATE_LIMIT, "")?)?,
            opts: BTreeMap::new(),
        })
    }

    fn read_tables(raw: &RawConfig) -> Result<TableSizes, ConfigError> {
        let mut tables = TableSizes::default();
        for table in SizedTable::ALL {
            *tables.get_mut(table) = raw.table_size(table)?;
        }
        Ok(tables)
    }

    /// Returns true if IPv4 is enabled.
    #[must_use]
    pub const fn ipv4_enabled(&self) -> bool {
        self.enable_ipv4
    }

    /// Returns true if IPv6 is enabled.
    #[must_use]
    pub const fn ipv6_enabled(&self) -> bool {
        self.enable_ipv6
    }

    /// Returns true if SCTP is enabled.
    #[must_use]
    pub const fn sctp_enabled(&self) -> bool {
        self.enable_sctp
    }

    /// Returns the IPAM backend in use.
    #[must_use]
    pub const fn ipam_mode(&self) -> IpamMode {
        self.ipam
    }

    /// Returns true if pod traffic is encapsulated.
    #[must_use]
    pub const fn tunneling_enabled(&self) -> bool {
        matches!(self.routing_mode, RoutingMode::Tunnel)
    }
}

impl fmt::Display for DaemonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ ipv4: {}, ipv6: {}, routing: {}, ipam: {}, ct-tcp: {}, ct-any: {}, \
             nat: {}, neigh: {}, auth: {}, fragments: {}, distributed-lru: {}, dry-mode: {} }}",
            self.enable_ipv4,
            self.enable_ipv6,
            self.routing_mode,
            self.ipam,
            self.tables.ct_tcp,
            self.tables.ct_any,
            self.tables.nat,
            self.tables.neighbor,
            self.tables.auth,
            self.tables.fragments,
            self.bpf_distributed_lru,
            self.dry_mode,
        )
    }
}

// Helper functions

fn parse_mode<T>(raw: &RawConfig, name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    let value = raw.str_or(name, default)?;
    value
        .parse()
        .map_err(|reason| ConfigError::parse(name, value.as_str(), reason))
}

fn parse_addr<T: std::str::FromStr>(
    raw: &RawConfig,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match raw.str_opt(name)? {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::parse(name, value.as_str(), "not a valid address")),
    }
}
