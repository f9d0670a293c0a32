//! Tests for the capacity planner.

use super::*;
use crate::config::{DaemonConfig, SizeOrigin, SizedTable, TableSize};

const GIB: u64 = 1 << 30;

fn planner() -> CapacityPlanner {
    CapacityPlanner::new(ByteBudgetModel::default())
}

fn planned(total_memory: u64, ratio: f64) -> DaemonConfig {
    let mut config = DaemonConfig::default();
    planner().plan(&mut config, total_memory, ratio);
    config
}

fn sizes(config: &DaemonConfig) -> [u32; 4] {
    [
        config.tables.entries(SizedTable::CtTcp),
        config.tables.entries(SizedTable::CtAny),
        config.tables.entries(SizedTable::Nat),
        config.tables.entries(SizedTable::Neighbor),
    ]
}

mod budget_model {
    use super::*;

    #[test]
    fn default_total_matches_static_layout() {
        assert_eq!(ByteBudgetModel::default().total_default_bytes(), 148_373_504);
    }

    #[test]
    fn entry_bytes_shares_ct_cost_between_protocols() {
        let model = ByteBudgetModel::new(10, 20, 30, 40);
        assert_eq!(model.entry_bytes(BudgetConsumer::CtTcp), 10);
        assert_eq!(model.entry_bytes(BudgetConsumer::CtAny), 10);
        assert_eq!(model.entry_bytes(BudgetConsumer::Nat), 20);
        assert_eq!(model.entry_bytes(BudgetConsumer::Neighbor), 30);
        assert_eq!(model.entry_bytes(BudgetConsumer::SockRevNat), 40);
    }

    #[test]
    fn weights_reproduce_static_defaults() {
        let base = u64::from(BASE_SHARE_ENTRIES);

        assert_eq!(share_weight(BudgetConsumer::CtTcp) * base, 524_288);
        assert_eq!(share_weight(BudgetConsumer::CtAny) * base, 262_144);
        assert_eq!(share_weight(BudgetConsumer::Nat) * base, 524_288);
        assert_eq!(share_weight(BudgetConsumer::Neighbor) * base, 524_288);
        assert_eq!(share_weight(BudgetConsumer::SockRevNat) * base, 262_144);
    }

    #[test]
    fn every_derived_share_has_a_budget_row() {
        for (table, derivation) in DERIVATIONS {
            if let Derivation::Share(consumer) = derivation {
                assert!(share_weight(consumer) > 0, "{table}");
            }
        }
    }

    #[test]
    fn with_possible_cpus_keeps_costs() {
        let model = ByteBudgetModel::default().with_possible_cpus(8);
        assert_eq!(model.possible_cpus, 8);
        assert_eq!(model.total_default_bytes(), 148_373_504);
    }
}

mod plan {
    use super::*;

    #[test]
    fn small_hosts_get_auto_minimums() {
        for total in [GIB / 2, GIB, 4 * GIB, 7 * GIB + GIB / 2] {
            let config = planned(total, 0.0025);
            assert_eq!(sizes(&config), [131_072, 65_536, 131_072, 131_072], "{total}");
        }
    }

    #[test]
    fn scales_with_memory() {
        let cases = [
            (16 * GIB, 151_765, 75_882),
            (30 * GIB, 284_560, 142_280),
            (240 * GIB, 2_276_484, 1_138_242),
            (360 * GIB, 3_414_726, 1_707_363),
        ];

        for (total, tcp, any) in cases {
            let config = planned(total, 0.0025);
            assert_eq!(sizes(&config), [tcp, any, tcp, tcp], "{total}");
        }
    }

    #[test]
    fn custom_ratio() {
        let config = planned(3 * GIB, 0.051);
        assert_eq!(sizes(&config), [580_503, 290_251, 580_503, 580_503]);
    }

    #[test]
    fn huge_ratio_clamps_to_max() {
        let config = planned(16 * GIB, 0.98);
        assert_eq!(sizes(&config), [16_777_216; 4]);
    }

    #[test]
    fn any_is_half_of_tcp() {
        for total in [16 * GIB, 30 * GIB, 61 * GIB, 240 * GIB] {
            let config = planned(total, 0.0025);
            let [tcp, any, _, _] = sizes(&config);
            assert_eq!(any, tcp / 2, "{total}");
        }
    }

    #[test]
    fn marks_derived_sizes_auto() {
        let config = planned(16 * GIB, 0.0025);
        for (table, _) in DERIVATIONS {
            assert_eq!(config.tables.get(table).origin, SizeOrigin::Auto);
        }
        assert_eq!(config.tables.auth.origin, SizeOrigin::Unset);
        assert_eq!(config.tables.fragments.origin, SizeOrigin::Unset);
    }

    #[test]
    fn idempotent() {
        let mut config = DaemonConfig::default();
        planner().plan(&mut config, 30 * GIB, 0.0025);
        let first = config.clone();
        planner().plan(&mut config, 30 * GIB, 0.0025);

        assert_eq!(config, first);
    }

    #[test]
    fn no_op_without_memory() {
        let config = planned(0, 0.0025);
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn no_op_for_ratio_outside_range() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = planned(16 * GIB, ratio);
            assert_eq!(config.tables, DaemonConfig::default().tables, "{ratio}");
        }
    }

    #[test]
    fn no_op_when_costs_are_zero() {
        let mut config = DaemonConfig::default();
        CapacityPlanner::new(ByteBudgetModel::new(0, 0, 0, 0)).plan(&mut config, 16 * GIB, 0.0025);

        assert_eq!(config, DaemonConfig::default());
    }
}

mod explicit_sizes {
    use super::*;

    #[test]
    fn explicit_tcp_is_kept() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(525_312);
        planner().plan(&mut config, 4 * GIB, 0.0025);

        assert_eq!(config.tables.ct_tcp, TableSize::explicit(525_312));
        assert_eq!(sizes(&config), [525_312, 65_536, 131_072, 131_072]);
    }

    #[test]
    fn nat_is_capped_to_explicit_conntrack() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(524_288);
        config.tables.ct_any = TableSize::explicit(262_144);
        planner().plan(&mut config, 128 * GIB, 0.0025);

        assert_eq!(sizes(&config), [524_288, 262_144, 524_288, 524_288]);
    }

    #[test]
    fn explicit_zero_is_left_for_validation() {
        let mut config = DaemonConfig::default();
        config.tables.ct_any = TableSize::explicit(0);
        planner().plan(&mut config, 16 * GIB, 0.0025);

        assert_eq!(config.tables.ct_any, TableSize::explicit(0));
    }

    #[test]
    fn explicit_neighbor_does_not_follow_nat() {
        let mut config = DaemonConfig::default();
        config.tables.neighbor = TableSize::explicit(4096);
        planner().plan(&mut config, 16 * GIB, 0.0025);

        assert_eq!(config.tables.nat.entries, 151_765);
        assert_eq!(config.tables.neighbor.entries, 4096);
    }
}

mod fit_nat {
    use super::*;

    #[test]
    fn shrinks_default_nat_to_small_conntrack() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(2048);
        config.tables.ct_any = TableSize::explicit(4096);
        planner().fit_nat_to_conntrack(&mut config);

        assert_eq!(config.tables.nat.entries, 4096);
        assert_eq!(config.tables.nat.origin, SizeOrigin::Auto);
    }

    #[test]
    fn shrinks_auto_nat_left_at_default() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(100_000);
        config.tables.ct_any = TableSize::explicit(50_000);
        config.tables.nat = TableSize::auto(config.tables.nat.entries);
        planner().plan(&mut config, 0, 0.0025);
        planner().fit_nat_to_conntrack(&mut config);

        assert_eq!(config.tables.nat, TableSize::auto(100_000));
    }

    #[test]
    fn keeps_default_nat_when_it_fits() {
        let mut config = DaemonConfig::default();
        planner().fit_nat_to_conntrack(&mut config);

        assert_eq!(config.tables.nat, DaemonConfig::default().tables.nat);
    }

    #[test]
    fn never_touches_explicit_nat() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(2048);
        config.tables.ct_any = TableSize::explicit(4096);
        config.tables.nat = TableSize::explicit(1 << 20);
        planner().fit_nat_to_conntrack(&mut config);

        assert_eq!(config.tables.nat, TableSize::explicit(1 << 20));
    }
}

mod distributed_lru {
    use super::*;

    fn lru_planner(cpus: u32) -> CapacityPlanner {
        CapacityPlanner::new(ByteBudgetModel::default().with_possible_cpus(cpus))
    }

    #[test]
    fn rounds_up_to_cpu_multiple() {
        let mut config = DaemonConfig {
            bpf_distributed_lru: true,
            ..DaemonConfig::default()
        };
        lru_planner(4).plan(&mut config, 3 * GIB, 0.051);

        assert_eq!(sizes(&config), [580_504, 290_252, 580_504, 580_504]);
    }

    #[test]
    fn already_aligned_sizes_unchanged() {
        let mut config = DaemonConfig {
            bpf_distributed_lru: true,
            ..DaemonConfig::default()
        };
        lru_planner(4).plan(&mut config, GIB, 0.0025);

        assert_eq!(sizes(&config), [131_072, 65_536, 131_072, 131_072]);
    }

    #[test]
    fn explicit_sizes_not_rounded() {
        let mut config = DaemonConfig {
            bpf_distributed_lru: true,
            ..DaemonConfig::default()
        };
        config.tables.ct_tcp = TableSize::explicit(525_313);
        lru_planner(4).plan(&mut config, 4 * GIB, 0.0025);

        assert_eq!(config.tables.ct_tcp.entries, 525_313);
    }

    #[test]
    fn reports_unaligned_explicit_sizes() {
        let mut config = DaemonConfig {
            bpf_distributed_lru: true,
            ..DaemonConfig::default()
        };
        config.tables.ct_tcp = TableSize::explicit(525_313);
        config.tables.ct_any = TableSize::explicit(262_144);

        assert_eq!(lru_planner(4).unaligned_shards(&config), [SizedTable::CtTcp]);
        assert!(lru_planner(1).unaligned_shards(&config).is_empty());
    }

    #[test]
    fn unaligned_sizes_ignored_without_distributed_lru() {
        let mut config = DaemonConfig::default();
        config.tables.ct_tcp = TableSize::explicit(525_313);

        assert!(lru_planner(4).unaligned_shards(&config).is_empty());
    }

    #[test]
    fn rounding_stays_within_max() {
        let mut config = DaemonConfig {
            bpf_distributed_lru: true,
            ..DaemonConfig::default()
        };
        lru_planner(3).plan(&mut config, 16 * GIB, 0.98);

        assert_eq!(sizes(&config), [16_777_215; 4]);
    }

    #[test]
    fn disabled_lru_skips_rounding() {
        let mut config = DaemonConfig::default();
        lru_planner(4).plan(&mut config, 3 * GIB, 0.051);

        assert_eq!(sizes(&config), [580_503, 290_251, 580_503, 580_503]);
    }
}

mod round_up {
    use super::*;

    #[test]
    fn rounds_to_next_multiple() {
        assert_eq!(round_up_within(580_503, 4, 1 << 24), 580_504);
        assert_eq!(round_up_within(10, 3, 100), 12);
    }

    #[test]
    fn exact_multiple_unchanged() {
        assert_eq!(round_up_within(12, 4, 100), 12);
    }

    #[test]
    fn single_cpu_unchanged() {
        assert_eq!(round_up_within(580_503, 1, 1 << 24), 580_503);
    }

    #[test]
    fn zero_cpus_treated_as_one() {
        assert_eq!(round_up_within(7, 0, 100), 7);
    }

    #[test]
    fn falls_back_below_max() {
        assert_eq!(round_up_within(99, 7, 100), 98);
        assert_eq!(round_up_within(16_777_216, 3, 16_777_216), 16_777_215);
    }
}
