//! Host facts the planner needs: total memory and possible CPUs.
//!
//! Only the binary probes the host; the library takes both figures as inputs.

use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

const MEMINFO: &str = "/proc/meminfo";
const POSSIBLE_CPUS: &str = "/sys/devices/system/cpu/possible";

/// Total system memory in bytes, from `MemTotal` in `/proc/meminfo`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no `MemTotal` line.
pub fn total_memory() -> io::Result<u64> {
    let content = std::fs::read_to_string(MEMINFO)?;
    parse_meminfo_total(&content).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no MemTotal line in {MEMINFO}"),
        )
    })
}

/// Number of CPUs the kernel may bring online.
///
/// Reads the possible-CPU list from sysfs and falls back to the available
/// parallelism when it is missing or malformed.
#[must_use]
pub fn possible_cpus() -> u32 {
    read_possible_cpus(Path::new(POSSIBLE_CPUS)).unwrap_or_else(|| {
        let fallback = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        tracing::debug!(fallback, "Possible CPU list unavailable, using available parallelism");
        u32::try_from(fallback).unwrap_or(u32::MAX)
    })
}

fn read_possible_cpus(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_cpu_list(&content)
}

/// Parses the `MemTotal:  16318480 kB` line into bytes.
fn parse_meminfo_total(content: &str) -> Option<u64> {
    let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
    let mut fields = line["MemTotal:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") => value.checked_mul(1024),
        None => Some(value),
        Some(_) => None,
    }
}

/// Counts CPUs in a kernel CPU list such as `0-7` or `0,2-5,8`.
fn parse_cpu_list(content: &str) -> Option<u32> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    content.split(',').try_fold(0u32, |count, part| {
        let n = match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.parse().ok()?;
                let end: u32 = end.parse().ok()?;
                end.checked_sub(start)?.checked_add(1)?
            }
            None => {
                part.parse::<u32>().ok()?;
                1
            }
        };
        count.checked_add(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meminfo_total_in_bytes() {
        let content = "MemTotal:       16318480 kB\nMemFree:         1234 kB\n";
        assert_eq!(parse_meminfo_total(content), Some(16_318_480 * 1024));
    }

    #[test]
    fn meminfo_without_total() {
        assert_eq!(parse_meminfo_total("MemFree: 1 kB\n"), None);
        assert_eq!(parse_meminfo_total("MemTotal: lots kB\n"), None);
    }

    #[test]
    fn cpu_list_range() {
        assert_eq!(parse_cpu_list("0-7\n"), Some(8));
    }

    #[test]
    fn cpu_list_single() {
        assert_eq!(parse_cpu_list("0"), Some(1));
    }

    #[test]
    fn cpu_list_mixed() {
        assert_eq!(parse_cpu_list("0,2-5,8"), Some(6));
    }

    #[test]
    fn cpu_list_malformed() {
        assert_eq!(parse_cpu_list(""), None);
        assert_eq!(parse_cpu_list("a-b"), None);
        assert_eq!(parse_cpu_list("5-2"), None);
        assert_eq!(parse_cpu_list("0,,1"), None);
    }

    #[test]
    fn possible_cpus_is_positive() {
        assert!(possible_cpus() >= 1);
    }

    #[test]
    fn missing_sysfs_file_yields_none() {
        assert_eq!(read_possible_cpus(Path::new("/nonexistent/cpu/possible")), None);
    }
}
