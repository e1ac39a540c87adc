//! `quotegate` binary entrypoint.
//!
//! Reads configuration from the environment and serves until SIGTERM / Ctrl-C.

use anyhow::Context;
use quotegate::quote::{Forwarder, HttpUpstream};
use quotegate::{Config, Server, app};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respect `RUST_LOG` if set; otherwise default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    if config.api_key.is_none() {
        warn!("CMS_API_KEY is not set; /get-quotes/ will answer 500 until it is");
    }
    info!(base_url = %config.base_url_trimmed(), "marketplace upstream");

    let upstream = HttpUpstream::new(config.base_url_trimmed())
        .context("failed to build marketplace client")?;
    let forwarder = Forwarder::new(upstream, config.api_key.clone());

    let server = Server::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    server.serve(app::router(forwarder)).await.context("server error")?;
    Ok(())
}
