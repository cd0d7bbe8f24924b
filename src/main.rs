/// MCP Stock Analysis Server
///
/// Advertises two tools, `getStockQuote` and `getHistoricalData`, and answers
/// them by running an external fetcher program. Configuration is read from
/// environment variables (see `core::config`):
/// - SERVER_NAME / SERVER_VERSION: reported in `initialize`
/// - MCP_TRANSPORT_MODE: "stdio" (default), "http", or "both"
/// - HOST / PORT / WORKER_THREADS: HTTP transport settings
/// - FETCHER_PROGRAM / FETCHER_SCRIPT: fetcher command (default `python3 scripts/fetch.py`)
/// - FETCHER_TIMEOUT_SECS: optional per-call fetch timeout
/// - RUST_LOG: log filter (logs always go to stderr)

mod core;
mod fetcher;
mod tools;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::core::config::{ServerConfig, TransportMode};
use crate::core::server::{self, McpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for protocol messages
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mcp_stock_analysis=info,actix_web=info")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    info!(
        fetcher = %config.fetcher.program,
        script = ?config.fetcher.script,
        timeout = ?config.fetcher.timeout,
        "fetcher configured"
    );

    let fetcher = Arc::new(config.fetcher.build());
    let server = Arc::new(McpServer::new(
        config.name.clone(),
        config.version.clone(),
        fetcher,
    ));

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(server).await?,
        TransportMode::Http => server::run_server_http(server, &config).await?,
        TransportMode::Both => {
            let stdio_server = server.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_server).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(server, &config).await;
            stdio_handle.abort();
            http_result?;
        }
    }

    Ok(())
}
