//! Core data model definitions shared across MarkGuard crates.
#![allow(missing_docs)]

pub mod history;
pub mod scan;
pub mod stats;
pub mod submission;

pub use history::ScanHistoryPage;
pub use scan::{
    DetectedData, DetectedFields, ScanResponse, ScanResult, Verdict,
};
pub use stats::{AggregateStats, StatsSnapshot};
pub use submission::{ImageUpload, PendingSubmission};
