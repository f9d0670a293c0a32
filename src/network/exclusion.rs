//! Local addresses the datapath must leave alone.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, key};

/// A parsed list of excluded local prefixes.
///
/// Entries may be prefixes (`3.3.3.0/24`) or bare addresses (`1.1.1.1`),
/// the latter becoming host prefixes. IPv4 and IPv6 entries can be mixed.
///
/// # Example
///
/// ```
/// use dpconf::network::LocalAddressExclusion;
///
/// let exclusion = LocalAddressExclusion::parse(&["1.1.1.1/32", "f00d::1/128"]).unwrap();
/// assert!(exclusion.is_excluded("1.1.1.1".parse().unwrap()));
/// assert!(!exclusion.is_excluded("f00d::2".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalAddressExclusion {
    prefixes: Vec<IpNet>,
}

impl LocalAddressExclusion {
    /// Parses every entry once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] naming the first entry that is neither
    /// a prefix nor an address.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let prefixes = entries
            .iter()
            .map(|entry| parse_entry(entry.as_ref().trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { prefixes })
    }

    /// Returns true if `addr` lies inside any excluded prefix.
    ///
    /// IPv4-mapped IPv6 addresses are matched as their IPv4 form.
    #[must_use]
    pub fn is_excluded(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        self.prefixes.iter().any(|prefix| prefix.contains(&addr))
    }

    /// Returns the parsed prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[IpNet] {
        &self.prefixes
    }

    /// Returns true if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

fn parse_entry(entry: &str) -> Result<IpNet, ConfigError> {
    if let Ok(net) = entry.parse::<IpNet>() {
        return Ok(net);
    }

    let addr: IpAddr = entry.parse().map_err(|_| {
        ConfigError::parse(
            key::EXCLUDE_LOCAL_ADDRESS,
            entry,
            "expected an address or a prefix",
        )
    })?;
    let host_len = if addr.is_ipv4() { 32 } else { 128 };
    IpNet::new(addr, host_len)
        .map_err(|e| ConfigError::parse(key::EXCLUDE_LOCAL_ADDRESS, entry, e.to_string()))
}
