use async_trait::async_trait;
use markguard_model::{
    AggregateStats, PendingSubmission, ScanHistoryPage, ScanResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::service::ScanService;

pub const STATS_PATH: &str = "api/v1/stats";
pub const SCAN_PATH: &str = "api/v1/scan-ic";
pub const HISTORY_PATH: &str = "api/v1/history";

/// HTTP client for the scan service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        info!(
            base_url = %config.base_url,
            "creating scan service client"
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Build an API URL below the configured base, keeping any path prefix
    /// the base carries.
    pub fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a request and decode a JSON body, treating non-2xx as failure.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Content type for the multipart image part, when the extension says.
fn image_mime(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

fn scan_form(submission: &PendingSubmission) -> Result<Form> {
    let mut file = Part::bytes(submission.image.bytes.clone())
        .file_name(submission.image.file_name.clone());
    if let Some(mime) = image_mime(&submission.image.file_name) {
        file = file.mime_str(mime)?;
    }
    Ok(Form::new()
        .part("file", file)
        .text("part_number", submission.part_number.clone()))
}

#[async_trait]
impl ScanService for ApiClient {
    async fn fetch_stats(&self) -> Result<AggregateStats> {
        let request = self.client.get(self.build_url(STATS_PATH));
        self.execute_json(request).await
    }

    async fn submit_scan(
        &self,
        submission: &PendingSubmission,
    ) -> Result<ScanResponse> {
        debug!(
            part_number = %submission.part_number,
            file_name = %submission.image.file_name,
            bytes = submission.image.len(),
            "posting scan"
        );
        let request = self
            .client
            .post(self.build_url(SCAN_PATH))
            .multipart(scan_form(submission)?);
        self.execute_json(request).await
    }

    async fn fetch_history(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ScanHistoryPage> {
        let request = self
            .client
            .get(self.build_url(HISTORY_PATH))
            .query(&[("page", page), ("limit", limit)]);
        self.execute_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::with_base_url(base).unwrap()).unwrap()
    }

    #[test]
    fn urls_join_below_base() {
        let api = client("http://localhost:8000");
        assert_eq!(
            api.build_url(STATS_PATH),
            "http://localhost:8000/api/v1/stats"
        );
        assert_eq!(
            api.build_url("/api/v1/scan-ic"),
            "http://localhost:8000/api/v1/scan-ic"
        );
    }

    #[test]
    fn urls_keep_base_path_prefix() {
        let api = client("https://gateway.example.com/markguard/");
        assert_eq!(
            api.build_url(HISTORY_PATH),
            "https://gateway.example.com/markguard/api/v1/history"
        );
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime("chip.JPG"), Some("image/jpeg"));
        assert_eq!(image_mime("board.png"), Some("image/png"));
        assert_eq!(image_mime("raw"), None);
        assert_eq!(image_mime("scan.heic"), None);
    }
}
