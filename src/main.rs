// Standard Library Imports
use std::{future, sync::Arc};

// External Crate Imports
use anyhow::{Result, anyhow};
use clap::Parser;
use pepmass::{
    config::{Args, DEFAULT_LOG_FILTER},
    render_report,
    routes::{AppState, create_router},
    self_check::self_check,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // NOTE: `miette` reports are rendered up front, since `anyhow` would otherwise drop their labels and help text
    let table = args.table.load_table().map_err(|e| anyhow!(render_report(&e)))?;
    let state = AppState::new(Arc::new(table), args.table.unknown_policy())
        .map_err(|e| anyhow!(render_report(&e)))?;
    let calculator = state.calculator().map_err(|e| anyhow!(render_report(&e)))?;
    self_check(&calculator).map_err(|e| anyhow!(render_report(&e)))?;

    let app = create_router(Arc::new(state));

    let bind_addr = args.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(address = %bind_addr, policy = ?args.table.unknown_blocks, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C, graceful shutdown is disabled");
        future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}
