//! Sized kernel tables and their capacity settings.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults;
use super::error::key;

/// A fixed-capacity kernel lookup table whose entry count is decided at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizedTable {
    /// TCP connection tracking.
    CtTcp,
    /// Connection tracking for every other protocol.
    CtAny,
    /// Source NAT.
    Nat,
    /// Neighbor (L2 next-hop) table.
    Neighbor,
    /// Authentication state.
    Auth,
    /// IP fragment tracking.
    Fragments,
}

/// Static bounds and defaults of one [`SizedTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLimits {
    /// Absolute minimum, applied to every value.
    pub min: u32,
    /// Absolute maximum, applied to every value.
    pub max: u32,
    /// Size used when nothing else decides.
    pub default: u32,
    /// Floor applied only to derived sizes. `None` for tables the planner never derives.
    pub auto_min: Option<u32>,
}

impl SizedTable {
    /// Every sized table, in validation order.
    pub const ALL: [Self; 6] = [
        Self::Auth,
        Self::CtTcp,
        Self::CtAny,
        Self::Nat,
        Self::Neighbor,
        Self::Fragments,
    ];

    /// Configuration key holding this table's size.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CtTcp => key::BPF_CT_GLOBAL_TCP_MAX,
            Self::CtAny => key::BPF_CT_GLOBAL_ANY_MAX,
            Self::Nat => key::BPF_NAT_GLOBAL_MAX,
            Self::Neighbor => key::BPF_NEIGH_GLOBAL_MAX,
            Self::Auth => key::BPF_AUTH_MAP_MAX,
            Self::Fragments => key::BPF_FRAGMENTS_MAP_MAX,
        }
    }

    /// Static limits of this table.
    #[must_use]
    pub const fn limits(self) -> TableLimits {
        match self {
            Self::CtTcp => TableLimits {
                min: defaults::LIMIT_TABLE_MIN,
                max: defaults::LIMIT_TABLE_MAX,
                default: defaults::CT_TCP_ENTRIES,
                auto_min: Some(defaults::LIMIT_TABLE_AUTO_CT_TCP_MIN),
            },
            Self::CtAny => TableLimits {
                min: defaults::LIMIT_TABLE_MIN,
                max: defaults::LIMIT_TABLE_MAX,
                default: defaults::CT_ANY_ENTRIES,
                auto_min: Some(defaults::LIMIT_TABLE_AUTO_CT_ANY_MIN),
            },
            Self::Nat => TableLimits {
                min: defaults::LIMIT_TABLE_MIN,
                max: defaults::LIMIT_TABLE_MAX,
                default: defaults::NAT_ENTRIES,
                auto_min: Some(defaults::LIMIT_TABLE_AUTO_NAT_MIN),
            },
            Self::Neighbor => TableLimits {
                min: defaults::LIMIT_TABLE_MIN,
                max: defaults::LIMIT_TABLE_MAX,
                default: defaults::NEIGH_ENTRIES,
                auto_min: Some(defaults::LIMIT_TABLE_AUTO_NAT_MIN),
            },
            Self::Auth => TableLimits {
                min: defaults::AUTH_ENTRIES_MIN,
                max: defaults::AUTH_ENTRIES_MAX,
                default: defaults::AUTH_ENTRIES,
                auto_min: None,
            },
            Self::Fragments => TableLimits {
                min: defaults::FRAGMENTS_ENTRIES_MIN,
                max: defaults::FRAGMENTS_ENTRIES_MAX,
                default: defaults::FRAGMENTS_ENTRIES,
                auto_min: None,
            },
        }
    }

    /// Returns true if the table is an LRU that may be sharded per CPU.
    #[must_use]
    pub const fn is_lru(self) -> bool {
        matches!(self, Self::CtTcp | Self::CtAny | Self::Nat | Self::Neighbor)
    }
}

impl fmt::Display for SizedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a table size came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeOrigin {
    /// Not configured; holds the static default until the planner runs.
    Unset,
    /// Derived (or to be derived) from the memory budget.
    Auto,
    /// Pinned by the operator. Never touched by the planner.
    Explicit,
}

/// Entry count of a sized table together with its origin.
///
/// Replaces a magic "zero means unset" value: an explicit zero is
/// representable and is rejected by range validation like any other
/// out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSize {
    /// Current entry count.
    pub entries: u32,
    /// How the entry count was decided.
    pub origin: SizeOrigin,
}

impl TableSize {
    /// A size the operator did not configure, holding the static default.
    #[must_use]
    pub const fn unset(default: u32) -> Self {
        Self {
            entries: default,
            origin: SizeOrigin::Unset,
        }
    }

    /// A size the planner is asked to derive, holding the static default for now.
    #[must_use]
    pub const fn auto(default: u32) -> Self {
        Self {
            entries: default,
            origin: SizeOrigin::Auto,
        }
    }

    /// A size pinned by the operator.
    #[must_use]
    pub const fn explicit(entries: u32) -> Self {
        Self {
            entries,
            origin: SizeOrigin::Explicit,
        }
    }

    /// Returns true if the operator pinned this size.
    #[must_use]
    pub const fn is_explicit(self) -> bool {
        matches!(self.origin, SizeOrigin::Explicit)
    }

    /// Returns true if the planner may replace this size.
    #[must_use]
    pub const fn is_derivable(self) -> bool {
        !self.is_explicit()
    }
}

impl fmt::Display for TableSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            SizeOrigin::Unset => write!(f, "{}", self.entries),
            SizeOrigin::Auto => write!(f, "{} (auto)", self.entries),
            SizeOrigin::Explicit => write!(f, "{} (explicit)", self.entries),
        }
    }
}

/// Sizes of every [`SizedTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableSizes {
    /// TCP connection tracking.
    pub ct_tcp: TableSize,
    /// Any-protocol connection tracking.
    pub ct_any: TableSize,
    /// NAT.
    pub nat: TableSize,
    /// Neighbor.
    pub neighbor: TableSize,
    /// Auth.
    pub auth: TableSize,
    /// Fragments.
    pub fragments: TableSize,
}

impl Default for TableSizes {
    fn default() -> Self {
        Self {
            ct_tcp: TableSize::unset(SizedTable::CtTcp.limits().default),
            ct_any: TableSize::unset(SizedTable::CtAny.limits().default),
            nat: TableSize::unset(SizedTable::Nat.limits().default),
            neighbor: TableSize::unset(SizedTable::Neighbor.limits().default),
            auth: TableSize::unset(SizedTable::Auth.limits().default),
            fragments: TableSize::unset(SizedTable::Fragments.limits().default),
        }
    }
}

impl TableSizes {
    /// Returns the size of one table.
    #[must_use]
    pub const fn get(&self, table: SizedTable) -> TableSize {
        match table {
            SizedTable::CtTcp => self.ct_tcp,
            SizedTable::CtAny => self.ct_any,
            SizedTable::Nat => self.nat,
            SizedTable::Neighbor => self.neighbor,
            SizedTable::Auth => self.auth,
            SizedTable::Fragments => self.fragments,
        }
    }

    /// Returns a mutable reference to the size of one table.
    pub fn get_mut(&mut self, table: SizedTable) -> &mut TableSize {
        match table {
            SizedTable::CtTcp => &mut self.ct_tcp,
            SizedTable::CtAny => &mut self.ct_any,
            SizedTable::Nat => &mut self.nat,
            SizedTable::Neighbor => &mut self.neighbor,
            SizedTable::Auth => &mut self.auth,
            SizedTable::Fragments => &mut self.fragments,
        }
    }

    /// Shortcut for the entry count of one table.
    #[must_use]
    pub const fn entries(&self, table: SizedTable) -> u32 {
        self.get(table).entries
    }
}
