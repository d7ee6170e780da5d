mod app;
mod cli;
mod command;
mod render;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;

const DEFAULT_LOG_FILTER: &str =
    "warn,markguard_core=info,markguard_console=info";

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenvy::dotenv().is_ok();
    let args = Args::parse();
    init_tracing();

    if env_loaded {
        tracing::info!("loaded .env file");
    }

    let config = args
        .client_config()
        .context("invalid scan service configuration")?;

    app::run(config).await
}
