//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::Result;

/// Address of the scan service when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Dashboard polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Extra stats fetches after a successful scan, relative to the success.
pub const DEFAULT_BURST_OFFSETS: [Duration; 4] = [
    Duration::from_millis(0),
    Duration::from_millis(300),
    Duration::from_millis(600),
    Duration::from_millis(1000),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service root; API paths are joined onto it.
    pub base_url: Url,
    pub poll_interval: Duration,
    pub burst_offsets: Vec<Duration>,
    /// `None` leaves requests unbounded; a hung submission then keeps the
    /// session busy until the connection drops.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL)
                .expect("default base URL is a valid absolute URL"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            burst_offsets: DEFAULT_BURST_OFFSETS.to_vec(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds a config for `base_url` with default timings.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn burst_offsets(mut self, offsets: Vec<Duration>) -> Self {
        self.burst_offsets = offsets;
        self
    }
}

/// Parses an operator-supplied base URL.
///
/// `localhost:8000` style input is accepted: surrounding whitespace and
/// trailing slashes are dropped and `http://` is added when no scheme is
/// present.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
    if with_scheme != raw {
        tracing::warn!(
            original = raw,
            normalized = %with_scheme,
            "normalized service base URL"
        );
    }
    Ok(Url::parse(&with_scheme)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(
            config.burst_offsets,
            vec![
                Duration::ZERO,
                Duration::from_millis(300),
                Duration::from_millis(600),
                Duration::from_millis(1000),
            ]
        );
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn adds_missing_scheme_and_trims_slashes() {
        let url = normalize_base_url("  localhost:9000/// ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn keeps_https() {
        let url = normalize_base_url("https://scan.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("scan.example.com"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_base_url("http://[::1").is_err());
    }
}
