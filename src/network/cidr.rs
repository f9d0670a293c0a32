//! Prefix-shaped configuration values.

use std::fmt;
use std::net::Ipv6Addr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, key};

/// Prefix length every IPv6 cluster allocation block must have.
pub const CLUSTER_ALLOC_PREFIX_LEN: u8 = 64;

/// The IPv6 prefix pod addresses are carved from, masked to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterAllocCidr {
    network: Ipv6Net,
}

impl ClusterAllocCidr {
    /// Parses and validates a cluster allocation prefix.
    ///
    /// The family is detected from the input; only IPv6 `/64` blocks are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the value is empty, not a prefix,
    /// not IPv6, or not exactly `/64`.
    ///
    /// # Example
    ///
    /// ```
    /// use dpconf::network::ClusterAllocCidr;
    ///
    /// let cidr = ClusterAllocCidr::parse("fdfd:fdfd:fdfd:fdfd:aaaa::/64").unwrap();
    /// assert_eq!(cidr.base().to_string(), "fdfd:fdfd:fdfd:fdfd::");
    /// ```
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        const FIELD: &str = key::IPV6_CLUSTER_ALLOC_CIDR;

        if value.is_empty() {
            return Err(ConfigError::parse(FIELD, value, "not set"));
        }

        let net: IpNet = value
            .parse()
            .map_err(|e: ipnet::AddrParseError| ConfigError::parse(FIELD, value, e.to_string()))?;

        match net {
            IpNet::V4(_) => Err(ConfigError::parse(FIELD, value, "must be an IPv6 prefix")),
            IpNet::V6(v6) if v6.prefix_len() != CLUSTER_ALLOC_PREFIX_LEN => Err(ConfigError::parse(
                FIELD,
                value,
                format!("prefix length must be /{CLUSTER_ALLOC_PREFIX_LEN}"),
            )),
            IpNet::V6(v6) => Ok(Self {
                network: v6.trunc(),
            }),
        }
    }

    /// The prefix-masked base address.
    #[must_use]
    pub fn base(&self) -> Ipv6Addr {
        self.network.network()
    }

    /// The masked prefix.
    #[must_use]
    pub const fn network(&self) -> Ipv6Net {
        self.network
    }
}

impl fmt::Display for ClusterAllocCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network)
    }
}

impl TryFrom<String> for ClusterAllocCidr {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClusterAllocCidr> for String {
    fn from(cidr: ClusterAllocCidr) -> Self {
        cidr.to_string()
    }
}

/// Parses an optional IPv4 prefix. Empty strings mean "not configured".
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the value is not an IPv4 prefix.
pub fn parse_ipv4_net(field: &'static str, value: &str) -> Result<Option<Ipv4Net>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e: ipnet::AddrParseError| ConfigError::parse(field, value, e.to_string()))
}

/// Parses an optional IPv6 prefix. Empty strings mean "not configured".
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the value is not an IPv6 prefix.
pub fn parse_ipv6_net(field: &'static str, value: &str) -> Result<Option<Ipv6Net>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e: ipnet::AddrParseError| ConfigError::parse(field, value, e.to_string()))
}
