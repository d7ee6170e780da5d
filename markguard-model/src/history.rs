use serde::{Deserialize, Serialize};

use crate::scan::ScanResponse;

/// One page of `GET /api/v1/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanHistoryPage {
    #[serde(default)]
    pub scans: Vec<ScanResponse>,
    #[serde(default)]
    pub total: u64,
}

impl ScanHistoryPage {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}
