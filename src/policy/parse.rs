//! Parser for `api-rate-limit` values.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{ConfigError, key};

use super::{ApiEndpoint, PolicyMap, Rate, RatePolicy};

/// Scope label used in errors for pairs outside any endpoint section.
const SHARED_SCOPE: &str = "all endpoints";

/// The two accepted input shapes, chosen once from the first character.
#[derive(Debug, Clone, Copy)]
enum PolicyInput<'a> {
    Json(&'a str),
    Flat(&'a str),
}

impl<'a> PolicyInput<'a> {
    fn detect(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            Self::Json(trimmed)
        } else {
            Self::Flat(trimmed)
        }
    }
}

/// Validates an `api-rate-limit` flag value without keeping the result.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] identifying the offending key and raw value.
///
/// # Example
///
/// ```
/// use dpconf::policy::validate_policy_map;
///
/// assert!(validate_policy_map("{}").is_ok());
/// assert!(validate_policy_map("endpoint-get=rate-limit:10/s,log:true").is_ok());
/// assert!(validate_policy_map("99").is_err());
/// ```
pub fn validate_policy_map(raw: &str) -> Result<(), ConfigError> {
    PolicyMap::parse(raw).map(|_| ())
}

impl PolicyMap {
    /// Parses either input shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, unknown endpoints,
    /// unknown sub-fields, and sub-field values of the wrong type.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match PolicyInput::detect(raw) {
            PolicyInput::Json(json) => Self::parse_json(json),
            PolicyInput::Flat(flat) => Self::parse_flat(flat),
        }
    }

    fn parse_json(json: &str) -> Result<Self, ConfigError> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|e| ConfigError::parse(key::API_RATE_LIMIT, json, e.to_string()))?;

        let mut map = Self::default();
        for (name, policy) in entries {
            let endpoint = parse_endpoint(&name)?;
            let policy = RatePolicy::parse(endpoint.as_str(), policy.split(','))?;
            map.endpoints.insert(endpoint, policy);
        }
        Ok(map)
    }

    fn parse_flat(flat: &str) -> Result<Self, ConfigError> {
        if flat.is_empty() {
            return Ok(Self::default());
        }

        let mut shared = Vec::new();
        let mut sections: Vec<(&str, Vec<&str>)> = Vec::new();
        for token in flat.split(',').map(str::trim) {
            if let Some((name, first)) = token.split_once('=') {
                sections.push((name.trim(), vec![first]));
            } else if let Some((_, pairs)) = sections.last_mut() {
                pairs.push(token);
            } else {
                shared.push(token);
            }
        }

        let mut map = Self::default();
        if !shared.is_empty() {
            map.shared = Some(RatePolicy::parse(SHARED_SCOPE, shared)?);
        }
        for (name, pairs) in sections {
            let endpoint = parse_endpoint(name)?;
            let policy = RatePolicy::parse(endpoint.as_str(), pairs)?;
            if map.endpoints.insert(endpoint, policy).is_some() {
                return Err(ConfigError::parse(
                    key::API_RATE_LIMIT,
                    name,
                    "endpoint configured more than once",
                ));
            }
        }
        Ok(map)
    }
}

impl RatePolicy {
    /// Parses `key:value` pairs into a policy.
    ///
    /// `scope` names the endpoint the pairs belong to and only appears in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for empty pairs, pairs without `:`,
    /// unknown or repeated keys, malformed values, and a minimum parallelism
    /// above the maximum.
    pub fn parse<'a>(
        scope: &str,
        pairs: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let mut policy = Self::default();
        let mut seen: Vec<&str> = Vec::new();

        for pair in pairs {
            let pair = pair.trim();
            let (name, value) = pair
                .split_once(':')
                .ok_or_else(|| policy_error(scope, pair, "expected key:value"))?;
            let (name, value) = (name.trim(), value.trim());

            if seen.contains(&name) {
                return Err(policy_error(scope, pair, "key given more than once"));
            }
            seen.push(name);

            policy.set(scope, pair, name, value)?;
        }

        if let Some((min, max)) = policy
            .min_parallel_requests
            .zip(policy.max_parallel_requests)
            .filter(|(min, max)| min > max)
        {
            return Err(policy_error(
                scope,
                &format!("min-parallel-requests:{min}"),
                &format!("must not exceed max-parallel-requests ({max})"),
            ));
        }

        Ok(policy)
    }

    fn set(&mut self, scope: &str, pair: &str, name: &str, value: &str) -> Result<(), ConfigError> {
        let err = |reason: &str| policy_error(scope, pair, reason);
        let int = || value.parse::<u64>().map_err(|_| err("expected an unsigned integer"));
        let boolean = || value.parse::<bool>().map_err(|_| err("expected true or false"));
        let duration = || humantime::parse_duration(value).map_err(|e| err(&e.to_string()));

        match name {
            "rate-limit" => self.rate_limit = Some(parse_rate(value).map_err(|r| err(&r))?),
            "rate-burst" => self.rate_burst = Some(int()?),
            "max-wait-duration" => self.max_wait_duration = Some(duration()?),
            "estimated-processing-duration" => {
                self.estimated_processing_duration = Some(duration()?);
            }
            "parallel-requests" => self.parallel_requests = Some(int()?),
            "min-parallel-requests" => self.min_parallel_requests = Some(int()?),
            "max-parallel-requests" => self.max_parallel_requests = Some(int()?),
            "auto-adjust" => self.auto_adjust = Some(boolean()?),
            "log" => self.log = Some(boolean()?),
            _ => return Err(err("unknown key")),
        }
        Ok(())
    }
}

/// Parses `COUNT/UNIT` where UNIT is a duration (`s`, `m`, `h`, `100ms`, `2s`).
fn parse_rate(value: &str) -> Result<Rate, String> {
    let (count, unit) = value
        .split_once('/')
        .ok_or_else(|| "expected COUNT/UNIT, e.g. 100/s".to_string())?;

    let count: f64 = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid rate count '{count}'"))?;
    if !count.is_finite() || count < 0.0 {
        return Err(format!("rate count must be a non-negative number, got {count}"));
    }

    let unit = unit.trim();
    let per = if unit.starts_with(|c: char| c.is_ascii_digit()) {
        humantime::parse_duration(unit)
    } else {
        humantime::parse_duration(&format!("1{unit}"))
    }
    .map_err(|e| format!("invalid rate unit '{unit}': {e}"))?;

    if per == Duration::ZERO {
        return Err("rate interval must be greater than zero".to_string());
    }

    Ok(Rate { count, per })
}

fn parse_endpoint(name: &str) -> Result<ApiEndpoint, ConfigError> {
    name.parse().map_err(|()| {
        ConfigError::parse(key::API_RATE_LIMIT, name, "unknown API endpoint")
    })
}

fn policy_error(scope: &str, pair: &str, reason: &str) -> ConfigError {
    ConfigError::parse(key::API_RATE_LIMIT, pair, format!("{reason} (in {scope})"))
}
