//! The running client.
//!
//! A [`ScanSession`] is created when the view mounts and torn down when it
//! unmounts. It owns the scheduler, the stats synchronizer and the scan
//! orchestrator, and hands the display layer read-only subscriptions to
//! their state.

use std::sync::Arc;

use markguard_model::{ImageUpload, ScanHistoryPage, StatsSnapshot};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{Result, ScanRejection};
use crate::orchestrator::{Notice, ScanOrchestrator, SessionView};
use crate::scheduler::TaskScheduler;
use crate::service::ScanService;
use crate::synchronizer::StatsSynchronizer;

/// One answer to [`ScanSession::request_history`].
#[derive(Debug)]
pub struct HistoryReply {
    pub page: u32,
    pub limit: u32,
    pub result: Result<ScanHistoryPage>,
}

#[derive(Debug)]
pub struct ScanSession {
    service: Arc<dyn ScanService>,
    scheduler: TaskScheduler,
    synchronizer: StatsSynchronizer,
    orchestrator: ScanOrchestrator,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
    history_tx: mpsc::UnboundedSender<HistoryReply>,
    history_rx: Option<mpsc::UnboundedReceiver<HistoryReply>>,
}

impl ScanSession {
    /// Connects to the configured service and starts polling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &ClientConfig) -> Result<Self> {
        let client = ApiClient::new(config)?;
        Ok(Self::with_service(Arc::new(client), config))
    }

    /// Starts a session against any [`ScanService`].
    pub fn with_service(
        service: Arc<dyn ScanService>,
        config: &ClientConfig,
    ) -> Self {
        let scheduler = TaskScheduler::new();
        let synchronizer = StatsSynchronizer::new(
            service.clone(),
            scheduler.clone(),
            config.poll_interval,
            config.burst_offsets.clone(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator =
            ScanOrchestrator::new(service.clone(), synchronizer.clone(), tx);
        let (history_tx, history_rx) = mpsc::unbounded_channel();

        synchronizer.start();
        info!("scan session started");

        Self {
            service,
            scheduler,
            synchronizer,
            orchestrator,
            notices: Some(rx),
            history_tx,
            history_rx: Some(history_rx),
        }
    }

    pub fn orchestrator(&self) -> &ScanOrchestrator {
        &self.orchestrator
    }

    pub fn synchronizer(&self) -> &StatsSynchronizer {
        &self.synchronizer
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<StatsSnapshot> {
        self.synchronizer.subscribe()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionView> {
        self.orchestrator.subscribe()
    }

    /// The notice stream has a single consumer; later calls return `None`.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notices.take()
    }

    /// History replies also have a single consumer.
    pub fn take_history_replies(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<HistoryReply>> {
        self.history_rx.take()
    }

    pub fn select_image(&self, image: ImageUpload) {
        self.orchestrator.select_image(image);
    }

    pub fn set_part_number(&self, part_number: impl Into<String>) {
        self.orchestrator.set_part_number(part_number);
    }

    /// Starts a submission in the background.
    ///
    /// Validation and the busy check run before this returns, so a
    /// rejection notice is already queued. Only the request itself runs on
    /// the scheduler, and its outcome is reported through the session view
    /// and the notice stream.
    pub fn spawn_submit(&self) -> std::result::Result<(), ScanRejection> {
        let submission = self.orchestrator.begin()?;
        let orchestrator = self.orchestrator.clone();
        self.scheduler.spawn(async move {
            if let Err(e) = orchestrator.complete(submission).await {
                debug!(error = %e, "submission ended without a result");
            }
        });
        Ok(())
    }

    /// Fetches the dashboard now, outside the periodic cadence.
    pub fn refresh_now(&self) {
        let synchronizer = self.synchronizer.clone();
        self.scheduler.spawn(async move {
            synchronizer.refresh().await;
        });
    }

    /// Fetches one page of past scans in the background.
    ///
    /// The page is delivered on the history reply stream and not retained.
    /// A slow or hung request holds up nothing but its own reply.
    pub fn request_history(&self, page: u32, limit: u32) {
        let service = self.service.clone();
        let replies = self.history_tx.clone();
        self.scheduler.spawn(async move {
            let result = service.fetch_history(page, limit).await;
            // Nobody listening once the view has gone away.
            let _ = replies.send(HistoryReply {
                page,
                limit,
                result,
            });
        });
    }

    /// Cancels polling, pending burst fetches and any in-flight submission.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
        info!("scan session stopped");
    }
}
