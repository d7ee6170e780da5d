//! MarkGuard client core
//!
//! Submits IC photographs to the remote classification service and keeps a
//! locally displayed copy of the service's aggregate dashboard converging on
//! the server's numbers.
//!
//! Two cooperating parts do the work:
//! - [`synchronizer::StatsSynchronizer`] polls the aggregate on a fixed
//!   cadence and runs a burst of extra fetches after each successful scan.
//! - [`orchestrator::ScanOrchestrator`] validates and submits one scan at a
//!   time and interprets the verdict.
//!
//! [`session::ScanSession`] owns both for the lifetime of a mounted view and
//! exposes their state through `tokio::sync::watch` subscriptions.

pub mod api_client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod synchronizer;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod view_model;

pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result, ScanRejection, SubmitError};
pub use orchestrator::{
    Notice, OrchestratorPhase, ScanOrchestrator, ScanOutcome, SessionView,
    Submission,
};
pub use scheduler::TaskScheduler;
pub use service::ScanService;
pub use session::{HistoryReply, ScanSession};
pub use synchronizer::StatsSynchronizer;
