//! fanout log-packet distributor.
//!
//! Main entry point: loads configuration, builds the dispatch engine,
//! starts the HTTP ingestion surface, and coordinates graceful shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use fanout_api::{server, Config};
use fanout_dispatch::DispatchEngine;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.rust_log);

    info!(
        workers = config.workers,
        capacity = config.capacity,
        targets = config.targets.len(),
        "starting fanout distributor"
    );

    let engine = DispatchEngine::new(&config.to_target_configs(), config.to_dispatch_config())
        .context("failed to build dispatch engine")?;
    let engine = Arc::new(engine);
    engine.start().await;

    let addr = config.parse_server_addr()?;
    let server_handle = tokio::spawn({
        let engine = engine.clone();
        let config = config.clone();
        async move {
            if let Err(e) = server::start_server(engine, &config, addr).await {
                error!(error = %e, "HTTP server failed");
            }
        }
    });

    info!(addr = %addr, "fanout is ready to receive packets");

    // The server resolves once the shutdown signal fires and in-flight
    // requests complete; the engine then drains its backlog.
    if server_handle.await.is_err() {
        error!("HTTP server task panicked");
    }

    info!("stopping dispatch engine");
    if let Err(e) = engine.shutdown().await {
        error!(error = %e, "engine shutdown incomplete");
    }

    info!("fanout shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
