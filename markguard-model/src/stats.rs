use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-owned rollup of every scan the service has judged.
///
/// The server may bump `total_scanned` before the per-verdict counters, so
/// `genuine + counterfeit <= total_scanned` is the only relation that holds
/// between fields of a single snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_scanned: u64,
    pub genuine: u64,
    pub counterfeit: u64,
    /// Percentage in `0..=100`, possibly fractional.
    pub yield_rate: f64,
}

/// The client's cached copy of [`AggregateStats`] plus when it arrived.
///
/// Always replaced as a whole; `observed_at` is `None` until the first
/// successful fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    pub stats: AggregateStats,
    pub observed_at: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    pub fn observed(stats: AggregateStats, at: DateTime<Utc>) -> Self {
        Self {
            stats,
            observed_at: Some(at),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.observed_at.is_none()
    }
}
