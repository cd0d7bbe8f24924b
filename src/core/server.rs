/// MCP Server Implementation
///
/// This module contains:
/// - `McpServer`, which routes JSON-RPC methods to handlers
/// - the STDIO transport (line-delimited JSON-RPC, one task per request)
/// - the HTTP transport built on Actix Web

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use actix_web::{
    App, HttpResponse, HttpServer, Result, web,
    middleware::{Compress, DefaultHeaders, Logger},
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::config::ServerConfig;
use crate::core::protocol::{
    CallToolParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, MCPRequest, MCPResponse,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::fetcher::Fetcher;
use crate::tools::{self, ToolRegistry};

/// Shared server state. Immutable apart from the request counter.
///
/// One instance is shared (behind `Arc`) by every in-flight request on both
/// transports.
pub struct McpServer {
    /// Server name as reported in `initialize` responses
    name: String,
    /// Server version string as reported in `initialize` responses
    version: String,
    /// Tools advertised by `tools/list`
    registry: ToolRegistry,
    /// Data source every `tools/call` is delegated to
    fetcher: Arc<dyn Fetcher>,
    /// Total requests and notifications received, for `/metrics`
    requests: AtomicU64,
}

impl McpServer {
    /// Create a server with the full tool registry.
    ///
    /// # Arguments
    /// * `name` - Server name for MCP protocol responses
    /// * `version` - Server version string
    /// * `fetcher` - Fetcher used for every tool call
    pub fn new(name: String, version: String, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            name,
            version,
            registry: tools::initialize_tools(),
            fetcher,
            requests: AtomicU64::new(0),
        }
    }

    /// Number of requests handled since start. Relaxed ordering is enough
    /// since the value is only reported, never used for synchronization.
    pub fn requests_total(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Route one request to its MCP method handler.
    ///
    /// # Returns
    /// `None` for notifications, otherwise the response to send back. Tool
    /// failures are reported inside a successful response with
    /// `isError: true`; only protocol problems become JSON-RPC errors.
    pub async fn handle_request(&self, req: MCPRequest) -> Option<MCPResponse> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if req.is_notification() {
            debug!(method = %req.method, "notification received");
            return None;
        }

        let id = req.id;
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => MCPResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            other => {
                MCPResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.name,
                    "version": self.version
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(id, json!({ "tools": self.registry.list_tools() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> MCPResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return MCPResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e));
            }
            None => return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params"),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = tools::call_tool(self.fetcher.as_ref(), &params.name, arguments).await;
        info!(tool = %params.name, is_error = result.is_error, "tool call completed");

        match serde_json::to_value(&result) {
            Ok(value) => MCPResponse::success(id, value),
            Err(e) => {
                MCPResponse::failure(id, INTERNAL_ERROR, format!("Unserializable result: {}", e))
            }
        }
    }

    /// Handle one raw line of the stdio stream.
    ///
    /// Lines that are not JSON get a parse error with a null id. JSON that is
    /// not a request gets an invalid-request error carrying its id, if any.
    pub async fn handle_line(&self, line: &str) -> Option<MCPResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(MCPResponse::failure(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<MCPRequest>(value) {
            Ok(req) => self.handle_request(req).await,
            Err(e) => {
                warn!(error = %e, "invalid request");
                Some(MCPResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ))
            }
        }
    }
}

/// Run the MCP server over standard input/output.
///
/// All logging goes to stderr so stdout carries only protocol messages.
pub async fn run_server_stdio(server: Arc<McpServer>) -> std::io::Result<()> {
    info!(name = %server.name, version = %server.version, "MCP server starting (STDIO mode)");

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = tokio::io::stdout();

    info!("MCP server started and ready for requests");
    serve_lines(server, stdin, stdout).await?;
    info!("stdin closed, STDIO transport stopped");
    Ok(())
}

/// Serve line-delimited JSON-RPC from `reader`, writing responses to `writer`.
///
/// Each request runs in its own task so a slow fetcher never blocks other
/// calls; responses are written in completion order. Returns the writer once
/// the input is exhausted and every in-flight request has been answered.
pub async fn serve_lines<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> std::io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut out = BufWriter::with_capacity(8192, writer);
        while let Some(message) = rx.recv().await {
            out.write_all(message.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
        }
        Ok::<W, std::io::Error>(out.into_inner())
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(response) = server.handle_line(&line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(json) => {
                    if tx.send(json).is_err() {
                        warn!("response dropped, writer has stopped");
                    }
                }
                Err(e) => error!(error = %e, "failed to serialize response"),
            }
        });
    }

    // The writer finishes once the last in-flight request drops its sender.
    drop(tx);
    writer_task
        .await
        .map_err(|e| std::io::Error::other(format!("writer task failed: {}", e)))?
}

/// Health check endpoint handler.
async fn health(server: web::Data<Arc<McpServer>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": server.name
    })))
}

/// Request counter for monitoring.
async fn metrics_handler(server: web::Data<Arc<McpServer>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": server.requests_total(),
        "status": "ok"
    })))
}

/// JSON-RPC endpoint. Notifications are acknowledged with 202 and no body.
async fn mcp_handler(
    server: web::Data<Arc<McpServer>>,
    req: web::Json<MCPRequest>,
) -> Result<HttpResponse> {
    match server.handle_request(req.into_inner()).await {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Routes shared by the HTTP server and its tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// # Arguments
/// * `server` - Shared server state
/// * `config` - Supplies the bind address and worker thread count
///
/// # Configuration
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(server: Arc<McpServer>, config: &ServerConfig) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    info!(
        name = %server.name,
        version = %server.version,
        bind = %bind_addr,
        workers = config.workers,
        "MCP server starting (HTTP mode)"
    );

    let data = web::Data::new(server);

    let http = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure_routes)
    })
    .workers(config.workers)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?;

    info!(bind = %bind_addr, "MCP server started and ready for requests");
    http.run().await
}
