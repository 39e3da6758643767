//! PlanSync - work order planning to Outlook calendar sync
//!
//! Main entry point: loads configuration, installs logging, starts the
//! scheduler and serves the status pages until Ctrl-C.

use std::net::SocketAddr;

use anyhow::Context as _;
use plansync_api::utils::logging::init_tracing;
use plansync_api::{router, AppContext};
use plansync_infra::{config, LogBuffer};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before config loading so `.env` secrets reach the overrides.
    let dotenv = dotenvy::dotenv();

    let config = config::load().context("failed to load configuration")?;
    let zone: chrono_tz::Tz = config
        .sync
        .time_zone
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown time zone: {}", config.sync.time_zone))?;

    let logs = LogBuffer::new(config.logging.buffer_size);
    let forwarder = init_tracing(&config.logging, zone, logs.clone())
        .context("failed to install tracing subscriber")?;
    let _log_task = forwarder.spawn();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => warn!(error = %err, "No .env file loaded"),
    }
    info!(version = env!("CARGO_PKG_VERSION"), "PlanSync starting");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let mut ctx = AppContext::from_config(config, logs).context("failed to wire sync pipeline")?;
    ctx.start().await.context("failed to start scheduler")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Status server listening");

    let served = axum::serve(listener, router(ctx.state()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(err) = ctx.shutdown().await {
        error!(error = %err, "Scheduler did not stop cleanly");
    }
    served.context("status server failed")?;
    info!("PlanSync stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
