//! Per-entry byte costs and the weight table they are combined with.

use crate::config::defaults;

/// Entries a share of weight 1 receives at the static defaults.
pub const BASE_SHARE_ENTRIES: u32 = defaults::CT_ANY_ENTRIES;

/// A table that consumes part of the memory budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetConsumer {
    /// TCP connection tracking.
    CtTcp,
    /// Any-protocol connection tracking.
    CtAny,
    /// NAT.
    Nat,
    /// Neighbor table.
    Neighbor,
    /// Socket reverse-NAT table. Consumes budget but is sized elsewhere.
    SockRevNat,
}

/// One row of the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetShare {
    /// Table consuming the share.
    pub consumer: BudgetConsumer,
    /// Multiple of [`BASE_SHARE_ENTRIES`] at the static defaults.
    pub weight: u64,
}

/// Every budget consumer and its weight.
///
/// Weights reproduce the static defaults: TCP CT and NAT/neighbor at
/// `2 * BASE`, any-protocol CT and socket reverse-NAT at `BASE`.
pub const BUDGET_SHARES: [BudgetShare; 5] = [
    BudgetShare {
        consumer: BudgetConsumer::CtTcp,
        weight: 2,
    },
    BudgetShare {
        consumer: BudgetConsumer::CtAny,
        weight: 1,
    },
    BudgetShare {
        consumer: BudgetConsumer::Nat,
        weight: 2,
    },
    BudgetShare {
        consumer: BudgetConsumer::Neighbor,
        weight: 2,
    },
    BudgetShare {
        consumer: BudgetConsumer::SockRevNat,
        weight: 1,
    },
];

/// Weight of `consumer` in [`BUDGET_SHARES`], or zero if it has no row.
#[must_use]
pub fn share_weight(consumer: BudgetConsumer) -> u64 {
    BUDGET_SHARES
        .iter()
        .find(|share| share.consumer == consumer)
        .map_or(0, |share| share.weight)
}

/// Byte costs of the budgeted tables plus the possible-CPU count.
///
/// The costs come from the subsystems owning each table's binary layout and
/// are treated as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBudgetModel {
    /// Bytes per connection-tracking entry (TCP and any-protocol).
    pub ct_entry_bytes: u64,
    /// Bytes per NAT entry.
    pub nat_entry_bytes: u64,
    /// Bytes per neighbor entry.
    pub neigh_entry_bytes: u64,
    /// Bytes per socket reverse-NAT entry.
    pub sock_rev_nat_entry_bytes: u64,
    /// Number of CPUs the kernel may bring online.
    pub possible_cpus: u32,
}

impl Default for ByteBudgetModel {
    fn default() -> Self {
        Self {
            ct_entry_bytes: defaults::SIZEOF_CT_ELEMENT,
            nat_entry_bytes: defaults::SIZEOF_NAT_ELEMENT,
            neigh_entry_bytes: defaults::SIZEOF_NEIGH_ELEMENT,
            sock_rev_nat_entry_bytes: defaults::SIZEOF_SOCK_REV_NAT_ELEMENT,
            possible_cpus: 1,
        }
    }
}

impl ByteBudgetModel {
    /// Creates a model from explicit byte costs.
    #[must_use]
    pub const fn new(ct: u64, nat: u64, neigh: u64, sock_rev_nat: u64) -> Self {
        Self {
            ct_entry_bytes: ct,
            nat_entry_bytes: nat,
            neigh_entry_bytes: neigh,
            sock_rev_nat_entry_bytes: sock_rev_nat,
            possible_cpus: 1,
        }
    }

    /// Sets the possible-CPU count used for sharded tables.
    #[must_use]
    pub const fn with_possible_cpus(mut self, cpus: u32) -> Self {
        self.possible_cpus = cpus;
        self
    }

    /// Bytes per entry of one consumer.
    #[must_use]
    pub const fn entry_bytes(&self, consumer: BudgetConsumer) -> u64 {
        match consumer {
            BudgetConsumer::CtTcp | BudgetConsumer::CtAny => self.ct_entry_bytes,
            BudgetConsumer::Nat => self.nat_entry_bytes,
            BudgetConsumer::Neighbor => self.neigh_entry_bytes,
            BudgetConsumer::SockRevNat => self.sock_rev_nat_entry_bytes,
        }
    }

    /// Bytes used by every consumer at its static default size.
    #[must_use]
    pub fn total_default_bytes(&self) -> u64 {
        BUDGET_SHARES
            .iter()
            .map(|share| {
                share.weight * u64::from(BASE_SHARE_ENTRIES) * self.entry_bytes(share.consumer)
            })
            .sum()
    }
}
