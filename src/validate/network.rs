//! Mode-dependent network checks.

use crate::config::{ConfigError, DaemonConfig, key};
use crate::network::{IpamMode, RoutingMode};

/// Runs every network check in order.
///
/// # Errors
///
/// Returns the first violation found.
pub fn check_network(config: &DaemonConfig) -> Result<(), ConfigError> {
    check_ipv4_native_routing_cidr(config)?;
    check_ipv6_native_routing_cidr(config)?;
    check_ipv6_cluster_alloc_cidr(config)?;
    check_ipam_delegated_plugin(config)
}

/// Requires an IPv4 native routing prefix when native routing masquerades IPv4.
///
/// ENI IPAM is exempt: the cloud installs the routes itself.
///
/// # Errors
///
/// Returns [`ConfigError::MissingNativeRoutingCidr`] naming the flags to set.
pub fn check_ipv4_native_routing_cidr(config: &DaemonConfig) -> Result<(), ConfigError> {
    let required = config.ipv4_native_routing_cidr.is_none()
        && config.enable_ipv4_masquerade
        && config.routing_mode == RoutingMode::Native
        && config.ipam != IpamMode::Eni
        && config.ipv4_enabled()
        && !config.enable_ip_masq_agent;

    if required {
        return Err(missing_cidr(
            config,
            key::IPV4_NATIVE_ROUTING_CIDR,
            key::ENABLE_IPV4_MASQUERADE,
        ));
    }
    Ok(())
}

/// Requires an IPv6 native routing prefix when native routing masquerades IPv6.
///
/// # Errors
///
/// Returns [`ConfigError::MissingNativeRoutingCidr`] naming the flags to set.
pub fn check_ipv6_native_routing_cidr(config: &DaemonConfig) -> Result<(), ConfigError> {
    let required = config.ipv6_native_routing_cidr.is_none()
        && config.enable_ipv6_masquerade
        && config.routing_mode == RoutingMode::Native
        && config.ipv6_enabled()
        && !config.enable_ip_masq_agent;

    if required {
        return Err(missing_cidr(
            config,
            key::IPV6_NATIVE_ROUTING_CIDR,
            key::ENABLE_IPV6_MASQUERADE,
        ));
    }
    Ok(())
}

/// Requires an IPv6 cluster allocation prefix whenever IPv6 is enabled.
///
/// The prefix itself is checked when it is parsed.
///
/// # Errors
///
/// Returns [`ConfigError::Prerequisite`] if IPv6 is enabled without one.
pub fn check_ipv6_cluster_alloc_cidr(config: &DaemonConfig) -> Result<(), ConfigError> {
    if config.ipv6_enabled() && config.ipv6_cluster_alloc_cidr.is_none() {
        return Err(ConfigError::Prerequisite(format!(
            "--{} must be provided when IPv6 is enabled",
            key::IPV6_CLUSTER_ALLOC_CIDR
        )));
    }
    Ok(())
}

/// Checks the prerequisites of delegated-plugin IPAM.
///
/// # Errors
///
/// Returns [`ConfigError::Prerequisite`] for the first unmet requirement:
/// endpoint health checking enabled, a missing local router address for an
/// enabled family, or the Envoy config subsystem enabled.
pub fn check_ipam_delegated_plugin(config: &DaemonConfig) -> Result<(), ConfigError> {
    if config.ipam != IpamMode::DelegatedPlugin {
        return Ok(());
    }
    let mode = IpamMode::DelegatedPlugin;

    if config.enable_health_checking && config.enable_endpoint_health_checking {
        return Err(ConfigError::Prerequisite(format!(
            "--{} must be disabled with --{}={mode}",
            key::ENABLE_ENDPOINT_HEALTH_CHECKING,
            key::IPAM
        )));
    }
    if config.ipv4_enabled() && config.local_router_ipv4.is_none() {
        return Err(ConfigError::Prerequisite(format!(
            "--{} must be provided when IPv4 is enabled with --{}={mode}",
            key::LOCAL_ROUTER_IPV4,
            key::IPAM
        )));
    }
    if config.ipv6_enabled() && config.local_router_ipv6.is_none() {
        return Err(ConfigError::Prerequisite(format!(
            "--{} must be provided when IPv6 is enabled with --{}={mode}",
            key::LOCAL_ROUTER_IPV6,
            key::IPAM
        )));
    }
    if config.enable_envoy_config {
        return Err(ConfigError::Prerequisite(format!(
            "--{} must be disabled with --{}={mode}",
            key::ENABLE_ENVOY_CONFIG,
            key::IPAM
        )));
    }
    Ok(())
}

fn missing_cidr(
    config: &DaemonConfig,
    flag: &'static str,
    masquerade_flag: &'static str,
) -> ConfigError {
    ConfigError::MissingNativeRoutingCidr {
        flag,
        masquerade_flag,
        ipam: config.ipam_mode().to_string(),
    }
}
