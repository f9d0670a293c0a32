//! Commented configuration template written by `dpconf init`.

/// Returns the default configuration template as a TOML string.
///
/// Every recognized key is listed with its default. Uncommented lines hold
/// the default value and parse back to the default configuration.
#[must_use]
pub fn default_config_template() -> String {
    r#"# dpconf configuration file
# Flat table of kebab-case keys. Any key can also be set with --set KEY=VALUE.

# ---------------------------------------------------------------------------
# Address families and routing
# ---------------------------------------------------------------------------

enable-ipv4 = true
enable-ipv6 = false
# enable-sctp = false

# Routing mode: "tunnel" (overlay) or "native" (underlying fabric)
routing-mode = "tunnel"

# IPAM backend: kubernetes, crd, eni, azure, alibabacloud, cluster-pool,
# multi-pool, delegated-plugin
ipam = "cluster-pool"

# Masquerade traffic leaving the node
# enable-ipv4-masquerade = true
# enable-ipv6-masquerade = true

# Delegate masquerading decisions to the ip-masq-agent
# enable-ip-masq-agent = false

# Prefixes reachable without masquerading. Required in native routing mode
# with masquerading enabled, unless the ip-masq-agent is used.
# ipv4-native-routing-cidr = "10.0.0.0/8"
# ipv6-native-routing-cidr = "fd00::/16"

# IPv6 cluster allocation block (must be a /64). Only read when IPv6 is enabled.
# ipv6-cluster-alloc-cidr = "f00d::/64"

# Router addresses, required with --ipam=delegated-plugin
# local-router-ipv4 = "169.254.0.1"
# local-router-ipv6 = "fe80::1"

# Local addresses the datapath leaves alone (prefixes or addresses)
# exclude-local-address = ["1.1.1.1/32", "f00d::1"]

# Reserved local ports on container IPs: "auto", or ports and ranges
# container-ip-local-reserved-ports = "1000,2000-2002"

# ---------------------------------------------------------------------------
# Health checking and subsystems
# ---------------------------------------------------------------------------

# enable-health-checking = true
# enable-endpoint-health-checking = true
# enable-envoy-config = false

# ---------------------------------------------------------------------------
# Kernel table sizes
# ---------------------------------------------------------------------------

# Share of system memory given to CT, NAT and neighbor tables (0.0 - 1.0).
# 0 disables dynamic sizing.
bpf-map-dynamic-size-ratio = 0.0025

# Table sizes: omit to use the static default (or the derived size when
# dynamic sizing is active), "auto" to always derive, or an entry count.
# bpf-ct-global-tcp-max = 524288
# bpf-ct-global-any-max = 262144
# bpf-nat-global-max = 524288
# bpf-neigh-global-max = 524288
# bpf-auth-map-max = 524288
# bpf-fragments-map-max = 8192

# Shard LRU tables per CPU; derived sizes are rounded to a CPU multiple
# bpf-distributed-lru = false

# Per-table event buffers: TABLE=STATE_SIZE_TTL
# bpf-map-event-buffers = ["ct=enabled_1024_1h"]

# ---------------------------------------------------------------------------
# Miscellaneous
# ---------------------------------------------------------------------------

# Compute everything but leave the datapath untouched
# dry-mode = false

# Interfaces carrying encrypted traffic. Entries may be appended across
# restarts; removing or reordering them is reported as drift.
# encrypt-interface = ["eth0"]

# API rate limits: a flat policy string or a JSON object of policy strings
# api-rate-limit = "endpoint-create=rate-limit:10/s,rate-burst:20,log:true"
"#
    .to_string()
}
