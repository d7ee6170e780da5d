//! Scan service trait
//!
//! Everything the core needs from the remote classification service. The
//! production implementation is [`ApiClient`](crate::api_client::ApiClient);
//! tests substitute a scripted stub.

use std::fmt::Debug;

use async_trait::async_trait;
use markguard_model::{
    AggregateStats, PendingSubmission, ScanHistoryPage, ScanResponse,
};

use crate::error::Result;

#[async_trait]
pub trait ScanService: Send + Sync + Debug {
    /// `GET /api/v1/stats`. Read-only and safe to call arbitrarily often.
    async fn fetch_stats(&self) -> Result<AggregateStats>;

    /// `POST /api/v1/scan-ic` with the image and declared part number.
    ///
    /// Mutates the server-side aggregate. Non-2xx statuses and malformed
    /// bodies are errors.
    async fn submit_scan(
        &self,
        submission: &PendingSubmission,
    ) -> Result<ScanResponse>;

    /// `GET /api/v1/history`, one page of past scans.
    async fn fetch_history(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ScanHistoryPage>;
}
