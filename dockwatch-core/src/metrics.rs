//! CPU and memory figures derived from the runtime's cumulative counters.
//!
//! The runtime reports monotonically increasing CPU totals at two points in
//! time (the current read and the previous one). The CPU percentage is the
//! container's share of the host's elapsed CPU time, scaled by core count.

use crate::error::FetchFailure;
use crate::model::StatSample;

/// Raw counters for one container, as read from the runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatCounters {
    pub cur_total_usage: u64,
    pub prev_total_usage: u64,
    pub cur_system_usage: u64,
    pub prev_system_usage: u64,
    pub core_count: u32,
    pub mem_usage: u64,
}

impl StatCounters {
    /// Picks the core count the way the runtime's own CLI does: the online
    /// CPU count when reported, else the number of per-CPU entries.
    pub fn resolve_core_count(online_cpus: Option<u64>, percpu_len: Option<usize>) -> u32 {
        online_cpus
            .filter(|&n| n > 0)
            .map(|n| n as u32)
            .or_else(|| percpu_len.filter(|&n| n > 0).map(|n| n as u32))
            .unwrap_or(1)
    }
}

/// CPU usage in percent of one core (so 4 busy cores read as 400).
///
/// Zero whenever either counter failed to advance, which covers container
/// restarts (counter reset) and the first sample (no previous reading).
pub fn cpu_percent(c: &StatCounters) -> f64 {
    let cpu_delta = c.cur_total_usage.saturating_sub(c.prev_total_usage);
    let system_delta = c.cur_system_usage.saturating_sub(c.prev_system_usage);
    if cpu_delta == 0 || system_delta == 0 {
        return 0.0;
    }
    (cpu_delta as f64 / system_delta as f64) * c.core_count as f64 * 100.0
}

pub fn sample(c: &StatCounters) -> StatSample {
    StatSample::new(cpu_percent(c), c.mem_usage)
}

/// Converts a fetch result into a sample, degrading failures to zeros.
pub fn sample_or_unavailable(result: Result<StatCounters, FetchFailure>) -> StatSample {
    match result {
        Ok(counters) => sample(&counters),
        Err(e) => {
            tracing::debug!(id = %e.id, reason = %e.reason, "stat fetch failed");
            StatSample::unavailable()
        }
    }
}
