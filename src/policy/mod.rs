//! Per-endpoint API rate-limit policies.
//!
//! The `api-rate-limit` value is accepted in two shapes:
//!
//! - a JSON object mapping endpoint names to policy strings:
//!   `{"endpoint-create": "rate-limit:16/s,rate-burst:32"}`
//! - a flat comma-separated string, optionally split into endpoint sections:
//!   `endpoint-create=rate-limit:100/s,rate-burst:300,log:true`
//!
//! Both shapes share one sub-field parser ([`RatePolicy::parse`]). Pairs in a
//! flat string that precede any `name=` section form the shared policy that
//! applies to every endpoint.

mod parse;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use parse::validate_policy_map;

/// API operation a rate-limit policy can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiEndpoint {
    /// Endpoint creation.
    EndpointCreate,
    /// Endpoint deletion.
    EndpointDelete,
    /// Single endpoint lookup.
    EndpointGet,
    /// Endpoint listing.
    EndpointList,
    /// Endpoint modification.
    EndpointPatch,
}

impl ApiEndpoint {
    /// Every known endpoint.
    pub const ALL: [Self; 5] = [
        Self::EndpointCreate,
        Self::EndpointDelete,
        Self::EndpointGet,
        Self::EndpointList,
        Self::EndpointPatch,
    ];

    /// Returns the name used in policy strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EndpointCreate => "endpoint-create",
            Self::EndpointDelete => "endpoint-delete",
            Self::EndpointGet => "endpoint-get",
            Self::EndpointList => "endpoint-list",
            Self::EndpointPatch => "endpoint-patch",
        }
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiEndpoint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.as_str() == s)
            .ok_or(())
    }
}

/// A request rate: `count` requests per `per`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Requests allowed per interval.
    pub count: f64,
    /// Interval length.
    pub per: Duration,
}

impl Rate {
    /// Requests per second.
    #[must_use]
    pub fn per_second(&self) -> f64 {
        self.count / self.per.as_secs_f64()
    }
}

/// Rate-limit settings for one endpoint. Unset fields keep the daemon's built-in values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RatePolicy {
    /// Sustained request rate.
    pub rate_limit: Option<Rate>,
    /// Requests allowed above the sustained rate.
    pub rate_burst: Option<u64>,
    /// Longest time a request may wait for admission.
    pub max_wait_duration: Option<Duration>,
    /// Expected processing time, used when auto-adjusting.
    pub estimated_processing_duration: Option<Duration>,
    /// Fixed number of requests processed in parallel.
    pub parallel_requests: Option<u64>,
    /// Lower bound for auto-adjusted parallelism.
    pub min_parallel_requests: Option<u64>,
    /// Upper bound for auto-adjusted parallelism.
    pub max_parallel_requests: Option<u64>,
    /// Adjust limits from observed processing times.
    pub auto_adjust: Option<bool>,
    /// Log every admission decision.
    pub log: Option<bool>,
}

/// Parsed `api-rate-limit` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PolicyMap {
    /// Policy applied to every endpoint without its own entry.
    pub shared: Option<RatePolicy>,
    /// Per-endpoint overrides.
    pub endpoints: BTreeMap<ApiEndpoint, RatePolicy>,
}

impl PolicyMap {
    /// Returns the policy in effect for `endpoint`.
    #[must_use]
    pub fn policy_for(&self, endpoint: ApiEndpoint) -> Option<&RatePolicy> {
        self.endpoints.get(&endpoint).or(self.shared.as_ref())
    }

    /// Returns true if no overrides are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.is_none() && self.endpoints.is_empty()
    }
}
