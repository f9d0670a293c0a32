//! Static bounds of sized tables and the dynamic size ratio.

use crate::config::{Bound, ConfigError, DaemonConfig, SizedTable, key};

/// Checks every sized table, the size ratio, and NAT against CT capacity.
///
/// # Errors
///
/// Returns [`ConfigError::OutOfRange`] for the first table or ratio outside
/// its bounds, or [`ConfigError::NatExceedsConntrack`] when NAT is larger
/// than both CT tables together.
///
/// # Example
///
/// ```
/// use dpconf::config::{DaemonConfig, TableSize};
/// use dpconf::validate::check_ranges;
///
/// let mut config = DaemonConfig::default();
/// assert!(check_ranges(&config).is_ok());
///
/// config.tables.auth = TableSize::explicit(255);
/// assert!(check_ranges(&config).is_err());
/// ```
pub fn check_ranges(config: &DaemonConfig) -> Result<(), ConfigError> {
    for table in SizedTable::ALL {
        check_table(table, config.tables.entries(table))?;
    }
    check_ratio(config.bpf_map_dynamic_size_ratio)?;
    check_nat_capacity(config)
}

/// Checks one table size against its static `[min, max]`.
///
/// # Errors
///
/// Returns [`ConfigError::OutOfRange`] naming the violated bound.
pub fn check_table(table: SizedTable, entries: u32) -> Result<(), ConfigError> {
    let limits = table.limits();
    if entries < limits.min {
        return Err(ConfigError::out_of_range(
            table.key(),
            entries,
            Bound::Minimum,
            limits.min,
        ));
    }
    if entries > limits.max {
        return Err(ConfigError::out_of_range(
            table.key(),
            entries,
            Bound::Maximum,
            limits.max,
        ));
    }
    Ok(())
}

/// Checks that the NAT table fits into the combined CT capacity.
///
/// # Errors
///
/// Returns [`ConfigError::NatExceedsConntrack`] if it does not.
pub fn check_nat_capacity(config: &DaemonConfig) -> Result<(), ConfigError> {
    let tcp = config.tables.entries(SizedTable::CtTcp);
    let any = config.tables.entries(SizedTable::CtAny);
    let nat = config.tables.entries(SizedTable::Nat);

    if u64::from(nat) > u64::from(tcp) + u64::from(any) {
        return Err(ConfigError::NatExceedsConntrack { nat, tcp, any });
    }
    Ok(())
}

fn check_ratio(ratio: f64) -> Result<(), ConfigError> {
    let field = key::BPF_MAP_DYNAMIC_SIZE_RATIO;
    if ratio.is_nan() || ratio < 0.0 {
        return Err(ConfigError::out_of_range(field, ratio, Bound::Minimum, 0.0));
    }
    if ratio > 1.0 {
        return Err(ConfigError::out_of_range(field, ratio, Bound::Maximum, 1.0));
    }
    Ok(())
}
