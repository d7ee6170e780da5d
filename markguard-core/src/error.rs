use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the scan service.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid service base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Reasons a submit request is turned away before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRejection {
    #[error("Please select a file and enter part number")]
    MissingImage,

    #[error("Please select a file and enter part number")]
    MissingPartNumber,

    #[error("A scan is already in progress")]
    Busy,
}

/// Why a submission did not produce a
/// [`ScanResult`](markguard_model::ScanResult).
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] ScanRejection),

    #[error("Error submitting scan: {0}")]
    Failed(#[from] ClientError),
}

impl SubmitError {
    pub fn rejection(&self) -> Option<ScanRejection> {
        match self {
            SubmitError::Rejected(reason) => Some(*reason),
            SubmitError::Failed(_) => None,
        }
    }
}
