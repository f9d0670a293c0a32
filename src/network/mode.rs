//! Routing and IPAM mode selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How pod traffic reaches other nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMode {
    /// Rely on the underlying network fabric to route pod prefixes.
    Native,
    /// Encapsulate pod traffic in an overlay.
    Tunnel,
}

impl RoutingMode {
    /// Returns the flag spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Tunnel => "tunnel",
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "tunnel" => Ok(Self::Tunnel),
            _ => Err("expected native or tunnel".to_string()),
        }
    }
}

/// IP address management backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IpamMode {
    /// Node pod prefixes come from the orchestrator's node objects.
    Kubernetes,
    /// Prefixes come from custom resources.
    Crd,
    /// AWS elastic network interfaces. Routes are installed by the cloud.
    Eni,
    /// Azure interfaces.
    Azure,
    /// Alibaba Cloud interfaces.
    AlibabaCloud,
    /// Cluster-wide pool managed by the operator.
    ClusterPool,
    /// Multiple named pools.
    MultiPool,
    /// An external CNI plugin owns address allocation.
    DelegatedPlugin,
}

impl IpamMode {
    /// Returns the flag spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Crd => "crd",
            Self::Eni => "eni",
            Self::Azure => "azure",
            Self::AlibabaCloud => "alibabacloud",
            Self::ClusterPool => "cluster-pool",
            Self::MultiPool => "multi-pool",
            Self::DelegatedPlugin => "delegated-plugin",
        }
    }
}

impl fmt::Display for IpamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kubernetes" => Ok(Self::Kubernetes),
            "crd" => Ok(Self::Crd),
            "eni" => Ok(Self::Eni),
            "azure" => Ok(Self::Azure),
            "alibabacloud" => Ok(Self::AlibabaCloud),
            "cluster-pool" => Ok(Self::ClusterPool),
            "multi-pool" => Ok(Self::MultiPool),
            "delegated-plugin" => Ok(Self::DelegatedPlugin),
            _ => Err(
                "expected one of kubernetes, crd, eni, azure, alibabacloud, cluster-pool, \
                 multi-pool, delegated-plugin"
                    .to_string(),
            ),
        }
    }
}
