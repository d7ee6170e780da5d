use std::time::Duration;

use clap::Parser;
use markguard_core::ClientConfig;
use markguard_core::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};

/// CLI entry point
#[derive(Parser, Debug, Clone)]
#[command(name = "markguard")]
#[command(
    about = "Submit IC photographs for authentication and watch the \
             inspection dashboard"
)]
pub struct Args {
    /// Base address of the scan service
    #[arg(long, env = "MARKGUARD_SERVER_URL", default_value = DEFAULT_BASE_URL)]
    pub server_url: String,

    /// Dashboard polling interval (e.g. 2s, 1500ms)
    #[arg(
        long,
        env = "MARKGUARD_POLL_INTERVAL",
        value_parser = humantime::parse_duration,
        default_value = "2s"
    )]
    pub poll_interval: Duration,

    /// Give up on a request after this long. Requests are unbounded when unset.
    #[arg(
        long,
        env = "MARKGUARD_REQUEST_TIMEOUT",
        value_parser = humantime::parse_duration
    )]
    pub request_timeout: Option<Duration>,
}

impl Args {
    pub fn client_config(&self) -> markguard_core::Result<ClientConfig> {
        let config = ClientConfig::with_base_url(&self.server_url)?
            .poll_interval(self.poll_interval)
            .request_timeout(self.request_timeout);
        if config.poll_interval != DEFAULT_POLL_INTERVAL {
            tracing::info!(
                interval = %humantime::format_duration(config.poll_interval),
                "using custom polling interval"
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_contract() {
        let args = Args::try_parse_from(["markguard"]).unwrap();
        let config = args.client_config().unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn durations_use_humantime() {
        let args = Args::try_parse_from([
            "markguard",
            "--server-url",
            "scanner.lab:9000",
            "--poll-interval",
            "1500ms",
            "--request-timeout",
            "1m",
        ])
        .unwrap();
        let config = args.client_config().unwrap();

        assert_eq!(config.base_url.as_str(), "http://scanner.lab:9000/");
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn bad_duration_is_rejected() {
        assert!(
            Args::try_parse_from(["markguard", "--poll-interval", "soon"])
                .is_err()
        );
    }
}
