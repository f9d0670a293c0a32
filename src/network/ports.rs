//! Reserved local port specification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, key};

/// An inclusive range of ports. A single port has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    /// First port in the range.
    pub start: u16,
    /// Last port in the range.
    pub end: u16,
}

impl PortRange {
    /// Returns true if `port` is inside the range.
    #[must_use]
    pub const fn contains(self, port: u16) -> bool {
        self.start <= port && port <= self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Ports reserved on container IPs.
///
/// `"auto"` and `""` both select the default behavior; otherwise the value is
/// a comma-separated list of ports and `start-end` ranges.
///
/// # Example
///
/// ```
/// use dpconf::network::ReservedPorts;
///
/// let ports = ReservedPorts::parse("1000,2000-2002,3000").unwrap();
/// assert!(ports.contains(2001));
/// assert!(ReservedPorts::parse("1000,,2000").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReservedPorts {
    /// No explicit reservation.
    #[default]
    Auto,
    /// Explicit reservations, in input order.
    Ports(Vec<PortRange>),
}

impl ReservedPorts {
    /// Parses the port list token by token, left to right.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] naming the first malformed token.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        if spec.is_empty() || spec == "auto" {
            return Ok(Self::Auto);
        }

        spec.split(',')
            .enumerate()
            .map(|(index, token)| parse_token(index, token))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Ports)
    }

    /// Returns true if `port` is explicitly reserved.
    #[must_use]
    pub fn contains(&self, port: u16) -> bool {
        match self {
            Self::Auto => false,
            Self::Ports(ranges) => ranges.iter().any(|r| r.contains(port)),
        }
    }
}

fn parse_token(index: usize, token: &str) -> Result<PortRange, ConfigError> {
    const FIELD: &str = key::CONTAINER_IP_LOCAL_RESERVED_PORTS;

    if token.is_empty() {
        return Err(ConfigError::parse(
            FIELD,
            token,
            format!("empty entry at position {}", index + 1),
        ));
    }

    let Some((start, end)) = token.split_once('-') else {
        let port = parse_port(token, token)?;
        return Ok(PortRange {
            start: port,
            end: port,
        });
    };

    let start = parse_port(token, start)?;
    let end = parse_port(token, end)?;
    if start > end {
        return Err(ConfigError::parse(
            FIELD,
            token,
            "range start must not exceed range end",
        ));
    }
    Ok(PortRange { start, end })
}

fn parse_port(token: &str, digits: &str) -> Result<u16, ConfigError> {
    const FIELD: &str = key::CONTAINER_IP_LOCAL_RESERVED_PORTS;

    if digits.is_empty() {
        return Err(ConfigError::parse(FIELD, token, "missing port number"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::parse(FIELD, token, "not a port number"));
    }
    digits
        .parse()
        .map_err(|_| ConfigError::parse(FIELD, token, "port must be at most 65535"))
}

impl fmt::Display for ReservedPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Ports(ranges) => {
                let parts: Vec<String> = ranges.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

impl TryFrom<String> for ReservedPorts {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReservedPorts> for String {
    fn from(ports: ReservedPorts) -> Self {
        ports.to_string()
    }
}
