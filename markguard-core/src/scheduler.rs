//! Cancellable task scheduling.
//!
//! Every timer-driven side effect in the client runs as a task owned by a
//! [`TaskScheduler`]. Cancelling the scheduler stops periodic loops, drops
//! pending one-shot tasks and interrupts in-flight work, so nothing survives
//! the session that created it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug)]
struct Inner {
    cancel: CancellationToken,
    tasks: Mutex<JoinSet<()>>,
}

#[derive(Debug, Clone)]
pub struct TaskScheduler {
    inner: Arc<Inner>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancel: CancellationToken::new(),
                tasks: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Number of tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.inner.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Runs `task` until it completes or the scheduler shuts down.
    ///
    /// Must be called from within a tokio runtime. Spawning after
    /// [`shutdown`](Self::shutdown) is a no-op.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            debug!("scheduler is shut down, dropping task");
            return;
        }
        let cancel = self.inner.cancel.clone();
        let mut tasks = self.inner.tasks.lock();
        // Reap finished tasks so long sessions don't accumulate handles.
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished
                && e.is_panic()
            {
                warn!(error = %e, "scheduled task panicked");
            }
        }
        tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        });
    }

    /// Runs `task` once, at `deadline`.
    pub fn spawn_at<F>(&self, deadline: Instant, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task.await;
        });
    }

    /// Starts a job immediately and then every `period`.
    ///
    /// Each run is its own task: a slow or hung run never delays the next
    /// tick, and runs may overlap. Late ticks are delayed rather than fired
    /// in a catch-up burst.
    pub fn spawn_periodic<F, Fut>(&self, period: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = self.clone();
        self.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                scheduler.spawn(job());
            }
        });
    }

    /// Cancels every task and waits for them to unwind.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut tasks = std::mem::take(&mut *self.inner.tasks.lock());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result
                && e.is_panic()
            {
                warn!(error = %e, "scheduled task panicked during shutdown");
            }
        }
        debug!("scheduler shut down");
    }
}
