//! Dashboard synchronization.
//!
//! [`StatsSynchronizer`] is the only writer of the cached
//! [`StatsSnapshot`]. It polls on a fixed cadence for as long as its
//! scheduler lives and, after a successful scan, runs a short burst of extra
//! fetches so the dashboard catches up with the server's post-write
//! aggregate without waiting for the next tick.
//!
//! Fetches are never serialized. Whichever response arrives last replaces
//! the snapshot, even if its request was issued first.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use markguard_model::StatsSnapshot;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::scheduler::TaskScheduler;
use crate::service::ScanService;

#[derive(Debug, Clone)]
pub struct StatsSynchronizer {
    service: Arc<dyn ScanService>,
    scheduler: TaskScheduler,
    snapshot: Arc<watch::Sender<StatsSnapshot>>,
    poll_interval: Duration,
    burst_offsets: Arc<[Duration]>,
}

impl StatsSynchronizer {
    pub fn new(
        service: Arc<dyn ScanService>,
        scheduler: TaskScheduler,
        poll_interval: Duration,
        burst_offsets: Vec<Duration>,
    ) -> Self {
        let (snapshot, _) = watch::channel(StatsSnapshot::default());
        Self {
            service,
            scheduler,
            snapshot: Arc::new(snapshot),
            poll_interval,
            burst_offsets: burst_offsets.into(),
        }
    }

    /// Latest snapshot; zeroed until the first successful fetch.
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.snapshot.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsSnapshot> {
        self.snapshot.subscribe()
    }

    /// Fetches the aggregate once and publishes it.
    ///
    /// A failed fetch keeps the previous snapshot and is only logged; a stale
    /// dashboard is preferable to interrupting the operator. Returns whether
    /// the snapshot was replaced.
    pub async fn refresh(&self) -> bool {
        match self.service.fetch_stats().await {
            Ok(stats) => {
                trace!(
                    total = stats.total_scanned,
                    genuine = stats.genuine,
                    counterfeit = stats.counterfeit,
                    yield_rate = stats.yield_rate,
                    "stats refreshed"
                );
                self.snapshot
                    .send_replace(StatsSnapshot::observed(stats, Utc::now()));
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "stats refresh failed, keeping previous snapshot"
                );
                false
            }
        }
    }

    /// Starts the periodic poll. The first fetch runs immediately.
    pub fn start(&self) {
        debug!(interval = ?self.poll_interval, "starting stats polling");
        let sync = self.clone();
        self.scheduler.spawn_periodic(self.poll_interval, move || {
            let sync = sync.clone();
            async move {
                sync.refresh().await;
            }
        });
    }

    /// Schedules the post-scan burst.
    ///
    /// Offsets are measured from this call, and the periodic poll is left
    /// untouched.
    pub fn burst(&self) {
        let origin = Instant::now();
        debug!(offsets = ?self.burst_offsets, "scheduling stats burst");
        for offset in self.burst_offsets.iter() {
            let sync = self.clone();
            self.scheduler.spawn_at(origin + *offset, async move {
                sync.refresh().await;
            });
        }
    }
}
