//! apilamad - apilama gateway daemon
//!
//! Serves one HTTP surface for the configured capabilities, each running
//! in-process or behind a remote endpoint.
//!
//! Usage:
//!   apilamad [--config apilama.toml] [--env-file .env] [--host HOST] [--port PORT] [--debug]
//!
//! With no config file, `files` and `dirs` run in-process on `./markdown`
//! and `shell` runs in-process in the current directory.

mod backends;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use apilama_api::{create_router, AppState};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "apilamad")]
#[command(author, version, about = "apilama API gateway daemon")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, env = "APILAMA_CONFIG")]
    config: Option<PathBuf>,

    /// Environment file (default: `.env` in the current directory or a parent)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Listen host (overrides HOST and the config file)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

const LOG_TARGETS: &[&str] = &[
    "apilamad",
    "apilama_api",
    "apilama_gateway",
    "apilama_local",
    "apilama_proxy",
    "tower_http",
];

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let default_filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv = config::load_dotenv(cli.env_file.as_deref())?;
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env()?;
    config.merge_with_args(cli.host.as_deref(), cli.port, cli.debug);

    init_tracing(config.server.debug);
    tracing::info!("Starting apilamad (apilama gateway daemon)");
    match cli.config {
        Some(ref path) => tracing::info!("Loaded config from: {}", path.display()),
        None => tracing::info!("No config file provided, using default capabilities"),
    }
    match dotenv {
        Some(ref path) => tracing::info!("Loaded environment from: {}", path.display()),
        None => tracing::debug!("No .env file found"),
    }

    let dispatcher = backends::build_dispatcher(&config)?;
    for (capability, state) in dispatcher.refresh_all().await {
        tracing::info!(capability = %capability, state = ?state, "Initial availability");
    }

    let state = AppState::new(Arc::new(dispatcher), config.server.name.clone());
    let app = create_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
