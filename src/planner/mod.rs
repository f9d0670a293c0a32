//! Memory-budgeted sizing of kernel tables.
//!
//! # Design
//!
//! - **Budget**: [`ByteBudgetModel`] carries the per-entry byte cost of every
//!   table drawing from the memory budget, plus the possible-CPU count.
//! - **Weights**: [`BUDGET_SHARES`] is a declarative weight table. Each share
//!   receives `weight * BASE_SHARE_ENTRIES` entries at the static defaults;
//!   scaling every share by the same factor keeps the proportions fixed
//!   (any-protocol CT = TCP CT / 2, NAT = TCP CT).
//! - **Derivation**: [`DERIVATIONS`] says how each planned table gets its
//!   size: its own weighted share, or a copy of another table.
//! - **Planner**: [`CapacityPlanner`] fills only sizes the operator did not pin,
//!   clamps them into `[auto_min, max]`, caps NAT to the CT capacity, and
//!   rounds sharded tables to a CPU multiple.

mod budget;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use budget::{
    BASE_SHARE_ENTRIES, BUDGET_SHARES, BudgetConsumer, BudgetShare, ByteBudgetModel, share_weight,
};

use crate::config::{DaemonConfig, SizeOrigin, SizedTable, TableSize};

/// How a planned table obtains its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Scaled share of the budget, weighted as the consumer's row in
    /// [`BUDGET_SHARES`].
    Share(BudgetConsumer),
    /// Same entry count as another (earlier) table.
    Follow(SizedTable),
}

/// Planned tables in evaluation order.
pub const DERIVATIONS: [(SizedTable, Derivation); 4] = [
    (SizedTable::CtTcp, Derivation::Share(BudgetConsumer::CtTcp)),
    (SizedTable::CtAny, Derivation::Share(BudgetConsumer::CtAny)),
    (SizedTable::Nat, Derivation::Share(BudgetConsumer::Nat)),
    (SizedTable::Neighbor, Derivation::Follow(SizedTable::Nat)),
];

/// Derives table sizes from total memory and a budget ratio.
///
/// Never fails: derived values are clamped, and explicitly configured sizes
/// are left for range validation to accept or reject.
///
/// # Example
///
/// ```
/// use dpconf::config::{DaemonConfig, SizedTable};
/// use dpconf::planner::{ByteBudgetModel, CapacityPlanner};
///
/// let mut config = DaemonConfig::default();
/// let planner = CapacityPlanner::new(ByteBudgetModel::default());
/// planner.plan(&mut config, 16 << 30, 0.0025);
///
/// assert_eq!(config.tables.entries(SizedTable::CtTcp), 151_765);
/// assert_eq!(config.tables.entries(SizedTable::CtAny), 75_882);
/// ```
#[derive(Debug, Clone)]
pub struct CapacityPlanner {
    budget: ByteBudgetModel,
}

impl CapacityPlanner {
    /// Creates a planner for the given byte costs and CPU count.
    #[must_use]
    pub const fn new(budget: ByteBudgetModel) -> Self {
        Self { budget }
    }

    /// Fills every size the operator did not pin.
    ///
    /// A no-op when `total_memory` is zero or `ratio` is outside `(0, 1]`.
    /// Re-running with the same inputs yields the same sizes.
    pub fn plan(&self, config: &mut DaemonConfig, total_memory: u64, ratio: f64) {
        for table in self.unaligned_shards(config) {
            tracing::warn!(
                %table,
                entries = config.tables.entries(table),
                cpus = self.budget.possible_cpus,
                "Explicit size is not a multiple of the possible CPUs, per-CPU shards are uneven"
            );
        }

        let Some(available) = available_bytes(total_memory, ratio) else {
            tracing::debug!(total_memory, ratio, "Dynamic table sizing disabled");
            return;
        };
        let total_default_bytes = self.budget.total_default_bytes();
        if total_default_bytes == 0 {
            tracing::debug!("All per-entry byte costs are zero, skipping dynamic sizing");
            return;
        }

        for (table, derivation) in DERIVATIONS {
            if config.tables.get(table).is_explicit() {
                continue;
            }

            let entries = match derivation {
                Derivation::Share(consumer) => {
                    let weight = share_weight(consumer);
                    let raw = scaled_entries(weight, available, total_default_bytes);
                    let entries = clamp_derived(table, raw);
                    if table == SizedTable::Nat {
                        cap_to_conntrack(config, entries)
                    } else {
                        entries
                    }
                }
                Derivation::Follow(source) => config.tables.entries(source),
            };

            *config.tables.get_mut(table) = TableSize {
                entries,
                origin: SizeOrigin::Auto,
            };
            tracing::debug!(%table, entries, "Derived table size");
        }

        if config.bpf_distributed_lru {
            self.round_to_cpus(config);
        }
    }

    /// Shrinks a NAT size the operator did not pin so it fits the CT tables.
    ///
    /// Covers the case where the CT sizes were pinned below their defaults and
    /// dynamic sizing did not run, leaving an unset or `"auto"` NAT at its
    /// static default. An explicit NAT size is never changed.
    pub fn fit_nat_to_conntrack(&self, config: &mut DaemonConfig) {
        let nat = config.tables.nat;
        if nat.is_explicit() {
            return;
        }

        let fitted = cap_to_conntrack(config, nat.entries);
        if fitted != nat.entries {
            tracing::debug!(from = nat.entries, to = fitted, "Fitted default NAT size to CT tables");
            config.tables.nat = TableSize {
                entries: fitted,
                origin: SizeOrigin::Auto,
            };
        }
    }

    /// Explicit sizes of sharded LRU tables that do not split evenly across
    /// the possible CPUs. Empty unless distributed LRU is enabled.
    #[must_use]
    pub fn unaligned_shards(&self, config: &DaemonConfig) -> Vec<SizedTable> {
        if !config.bpf_distributed_lru {
            return Vec::new();
        }
        let cpus = self.budget.possible_cpus.max(1);
        SizedTable::ALL
            .into_iter()
            .filter(|table| table.is_lru())
            .filter(|&table| {
                let size = config.tables.get(table);
                size.is_explicit() && size.entries % cpus != 0
            })
            .collect()
    }

    fn round_to_cpus(&self, config: &mut DaemonConfig) {
        let cpus = self.budget.possible_cpus.max(1);
        for (table, _) in DERIVATIONS {
            let size = config.tables.get_mut(table);
            if size.is_derivable() && table.is_lru() {
                size.entries = round_up_within(size.entries, cpus, table.limits().max);
            }
        }
    }
}

/// Bytes the planner may spend, or `None` when dynamic sizing is disabled.
fn available_bytes(total_memory: u64, ratio: f64) -> Option<u64> {
    if total_memory == 0 || ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let available = (total_memory as f64 * ratio) as u64;
    Some(available)
}

/// Entries for a share of `weight` when `available` bytes are spread over a
/// default layout costing `total_default_bytes`.
fn scaled_entries(weight: u64, available: u64, total_default_bytes: u64) -> u64 {
    let default_entries = u128::from(weight) * u128::from(BASE_SHARE_ENTRIES);
    let scaled = default_entries * u128::from(available) / u128::from(total_default_bytes);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn clamp_derived(table: SizedTable, raw: u64) -> u32 {
    let limits = table.limits();
    let floor = limits.auto_min.unwrap_or(limits.min);
    let clamped = raw.clamp(u64::from(floor), u64::from(limits.max));
    u32::try_from(clamped).unwrap_or(limits.max)
}

/// Caps a NAT size to two thirds of the combined CT capacity when it would
/// otherwise exceed that capacity.
fn cap_to_conntrack(config: &DaemonConfig, nat: u32) -> u32 {
    let ct_total = u64::from(config.tables.entries(SizedTable::CtTcp))
        + u64::from(config.tables.entries(SizedTable::CtAny));
    if u64::from(nat) <= ct_total {
        return nat;
    }
    u32::try_from(ct_total * 2 / 3).unwrap_or(u32::MAX)
}

/// Rounds `entries` up to a multiple of `cpus`. Falls back to the largest
/// multiple not above `max` when rounding up would exceed it.
#[must_use]
pub fn round_up_within(entries: u32, cpus: u32, max: u32) -> u32 {
    let cpus = u64::from(cpus.max(1));
    let rounded = u64::from(entries).div_ceil(cpus) * cpus;
    if rounded <= u64::from(max) {
        return u32::try_from(rounded).unwrap_or(max);
    }
    let lowered = u64::from(max) / cpus * cpus;
    u32::try_from(lowered).unwrap_or(max)
}
