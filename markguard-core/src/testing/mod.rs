//! Scripted [`ScanService`] for tests.
//!
//! Responses are queued per endpoint and consumed in call order. Every call
//! is recorded so tests can assert on how often and when the service was
//! hit. Time is read from `tokio::time`, so recorded instants follow the
//! paused clock in `start_paused` tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use markguard_model::{
    AggregateStats, PendingSubmission, ScanHistoryPage, ScanResponse,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{ClientError, Result};
use crate::service::ScanService;

fn server_error(message: &str) -> ClientError {
    ClientError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: message.to_string(),
    }
}

/// One scripted answer to `fetch_stats`.
#[derive(Debug, Clone)]
pub struct StubStats {
    delay: Duration,
    result: std::result::Result<AggregateStats, String>,
}

impl StubStats {
    pub fn ok(stats: AggregateStats) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(stats),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.into()),
        }
    }

    /// Answer only after `delay` has elapsed.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One scripted answer to `submit_scan`.
#[derive(Debug)]
pub enum StubScan {
    Respond(ScanResponse),
    Fail(String),
    /// Stays in flight until the paired [`ScanGate`] is released.
    Held(oneshot::Receiver<std::result::Result<ScanResponse, String>>),
}

/// Releases a held submission.
#[derive(Debug)]
pub struct ScanGate {
    tx: oneshot::Sender<std::result::Result<ScanResponse, String>>,
}

impl ScanGate {
    pub fn respond(self, response: ScanResponse) {
        let _ = self.tx.send(Ok(response));
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(message.into()));
    }
}

/// Releases a held history request.
#[derive(Debug)]
pub struct HistoryGate {
    tx: oneshot::Sender<ScanHistoryPage>,
}

impl HistoryGate {
    pub fn respond(self, page: ScanHistoryPage) {
        let _ = self.tx.send(page);
    }
}

#[derive(Debug, Default)]
struct StubState {
    stats: VecDeque<StubStats>,
    default_stats: Option<AggregateStats>,
    scans: VecDeque<StubScan>,
    history: Option<ScanHistoryPage>,
    held_history: Option<oneshot::Receiver<ScanHistoryPage>>,
    stats_calls: Vec<Instant>,
    scan_calls: Vec<PendingSubmission>,
    history_calls: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub struct StubScanService {
    state: Arc<Mutex<StubState>>,
}

impl StubScanService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stats(&self, stats: StubStats) {
        self.state.lock().stats.push_back(stats);
    }

    /// Answer used once the scripted stats queue is empty. Without one,
    /// unscripted fetches fail.
    pub fn set_default_stats(&self, stats: AggregateStats) {
        self.state.lock().default_stats = Some(stats);
    }

    pub fn push_scan(&self, scan: StubScan) {
        self.state.lock().scans.push_back(scan);
    }

    pub fn push_scan_response(&self, response: ScanResponse) {
        self.push_scan(StubScan::Respond(response));
    }

    pub fn push_scan_failure(&self, message: impl Into<String>) {
        self.push_scan(StubScan::Fail(message.into()));
    }

    /// Queues a submission that stays in flight until the gate is released.
    pub fn hold_next_scan(&self) -> ScanGate {
        let (tx, rx) = oneshot::channel();
        self.push_scan(StubScan::Held(rx));
        ScanGate { tx }
    }

    pub fn set_history(&self, page: ScanHistoryPage) {
        self.state.lock().history = Some(page);
    }

    /// The next history request stays in flight until the gate is
    /// released.
    pub fn hold_next_history(&self) -> HistoryGate {
        let (tx, rx) = oneshot::channel();
        self.state.lock().held_history = Some(rx);
        HistoryGate { tx }
    }

    pub fn stats_calls(&self) -> Vec<Instant> {
        self.state.lock().stats_calls.clone()
    }

    pub fn scan_calls(&self) -> Vec<PendingSubmission> {
        self.state.lock().scan_calls.clone()
    }

    pub fn history_calls(&self) -> Vec<(u32, u32)> {
        self.state.lock().history_calls.clone()
    }
}

#[async_trait]
impl ScanService for StubScanService {
    async fn fetch_stats(&self) -> Result<AggregateStats> {
        let next = {
            let mut state = self.state.lock();
            state.stats_calls.push(Instant::now());
            match state.stats.pop_front() {
                Some(next) => next,
                None => match state.default_stats {
                    Some(stats) => StubStats::ok(stats),
                    None => StubStats::fail("no stats scripted"),
                },
            }
        };
        if !next.delay.is_zero() {
            tokio::time::sleep(next.delay).await;
        }
        next.result.map_err(|message| server_error(&message))
    }

    async fn submit_scan(
        &self,
        submission: &PendingSubmission,
    ) -> Result<ScanResponse> {
        let next = {
            let mut state = self.state.lock();
            state.scan_calls.push(submission.clone());
            state.scans.pop_front()
        };
        match next {
            Some(StubScan::Respond(response)) => Ok(response),
            Some(StubScan::Fail(message)) => Err(server_error(&message)),
            Some(StubScan::Held(rx)) => match rx.await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(message)) => Err(server_error(&message)),
                Err(_) => Err(server_error("scan gate dropped")),
            },
            None => Err(server_error("no scan scripted")),
        }
    }

    async fn fetch_history(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ScanHistoryPage> {
        let held = {
            let mut state = self.state.lock();
            state.history_calls.push((page, limit));
            match state.held_history.take() {
                Some(rx) => rx,
                None => return Ok(state.history.clone().unwrap_or_default()),
            }
        };
        held.await.map_err(|_| server_error("history gate dropped"))
    }
}

/// A well-formed scan response for `part_number` with the given status.
pub fn scan_response(part_number: &str, status: &str) -> ScanResponse {
    ScanResponse {
        file_id: "3f2b9c1e-8d4a-4f6b-9e2d-7a1c5b8e0f42".to_string(),
        part_number: part_number.to_string(),
        status: status.to_string(),
        confidence: 87.456,
        issues: None,
        explanation: None,
        detected_data: None,
    }
}
