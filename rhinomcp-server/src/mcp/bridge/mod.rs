//! MCP Bridge - Connects the assistant's stdio channel to the command server
//!
//! Reads newline-delimited JSON requests, answers capability negotiation
//! locally, and relays tool calls over short-lived TCP connections. Tool calls
//! run concurrently with the read loop; every response line goes through a
//! single serialized writer so overlapping completions never interleave.

mod relay;

pub use relay::{RelayClient, RelayError, CONNECT_TIMEOUT, READ_TIMEOUT};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rhinomcp_protocol::resolve_tool_name;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::mcp::error::McpError;
use crate::mcp::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolsListResult,
};

/// Global request counter for log correlation within this bridge instance
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Methods that are notifications by definition and never get a response
const NOTIFICATION_METHODS: &[&str] = &[
    "initialized",
    "notifications/initialized",
    "notifications/cancelled",
];

/// Read-loop timing knobs
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// How long stdin may stay silent before a liveness line is logged
    pub idle_log_interval: Duration,
    /// Pause between polls once stdin has reached EOF
    pub eof_retry_delay: Duration,
    /// How long in-flight tool calls may run after shutdown
    pub shutdown_grace: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::from(&BridgeConfig::default())
    }
}

impl From<&BridgeConfig> for BridgeOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            idle_log_interval: config.idle_log_interval(),
            eof_retry_delay: config.eof_retry_delay(),
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// Serializes response lines onto the output channel
struct ResponseWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for ResponseWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write one response as a single line and flush it
    async fn send(&self, req_id: u64, response: &JsonRpcResponse) {
        if let Err(e) = self.try_send(response).await {
            error!(req_id, error = %e, "Failed to write response");
        }
    }

    async fn try_send(&self, response: &JsonRpcResponse) -> Result<(), McpError> {
        let mut line = serde_json::to_vec(response)
            .map_err(|e| McpError::Internal(e.to_string()))?;
        line.push(b'\n');

        let mut writer = self.inner.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// What the read loop should do after handling a line
enum Flow {
    Continue,
    Shutdown,
}

/// MCP Bridge
///
/// Long-lived stdio endpoint. Survives stdin EOF (the assistant may come back
/// and re-initialize) and runs until `shutdown` or a termination signal.
pub struct McpBridge {
    relay: RelayClient,
    options: BridgeOptions,
}

impl McpBridge {
    pub fn new(relay: RelayClient, options: BridgeOptions) -> Self {
        Self { relay, options }
    }

    /// Run the bridge on the process's stdin/stdout
    pub async fn run_stdio<S>(&self, shutdown: S) -> Result<(), McpError>
    where
        S: Future<Output = ()>,
    {
        let reader = BufReader::new(tokio::io::stdin());
        self.run(reader, tokio::io::stdout(), shutdown).await
    }

    /// Run the read loop until `shutdown` completes or a shutdown request arrives
    pub async fn run<R, W, S>(&self, reader: R, writer: W, shutdown: S) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let out = ResponseWriter::new(writer);
        let mut lines = reader.lines();
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut at_eof = false;
        tokio::pin!(shutdown);

        info!(relay = %self.relay.addr(), "MCP bridge starting");

        loop {
            reap(&mut in_flight);

            let read = tokio::select! {
                _ = &mut shutdown => {
                    info!("Termination signal received");
                    break;
                }
                read = tokio::time::timeout(self.options.idle_log_interval, lines.next_line()) => read,
            };

            let line = match read {
                Err(_) => {
                    debug!(in_flight = in_flight.len(), "No input received, still waiting");
                    continue;
                }
                Ok(Ok(Some(line))) => {
                    if at_eof {
                        info!("Input stream resumed");
                        at_eof = false;
                    }
                    line
                }
                Ok(Ok(None)) => {
                    if !at_eof {
                        info!("Client disconnected (input stream EOF), waiting for reconnect");
                        at_eof = true;
                    }
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Termination signal received");
                            break;
                        }
                        _ = tokio::time::sleep(self.options.eof_retry_delay) => {}
                    }
                    continue;
                }
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                    let req_id = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
                    warn!(req_id, error = %e, "Input line is not valid UTF-8");
                    let err: JsonRpcError = McpError::Malformed(e.to_string()).into();
                    out.send(req_id, &JsonRpcResponse::error(json!(0), err)).await;
                    continue;
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Failed to read input");
                    tokio::time::sleep(self.options.eof_retry_delay).await;
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Flow::Shutdown = self.handle_line(&line, &out, &mut in_flight).await {
                break;
            }
        }

        self.drain(&mut in_flight).await;
        info!("MCP bridge stopped");
        Ok(())
    }

    /// Handle one input line
    async fn handle_line<W>(
        &self,
        line: &str,
        out: &ResponseWriter<W>,
        in_flight: &mut JoinSet<()>,
    ) -> Flow
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let req_id = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        debug!(req_id, raw = %line, "Received raw request");

        let (request, method) = match parse_request(line) {
            Ok(parsed) => parsed,
            Err((id, e)) => {
                warn!(req_id, error = %e, raw_input = %line, "Rejecting malformed request");
                out.send(req_id, &JsonRpcResponse::error(id, e.into())).await;
                return Flow::Continue;
            }
        };

        info!(req_id, method = %method, jsonrpc_id = ?request.id, "Incoming request");

        if NOTIFICATION_METHODS.contains(&method.as_str()) {
            debug!(req_id, method = %method, "Notification handled (no response)");
            return Flow::Continue;
        }

        let start = Instant::now();
        let (outcome, flow) = match method.as_str() {
            "initialize" => (self.handle_initialize(), Flow::Continue),
            "tools/list" => (self.handle_tools_list(), Flow::Continue),
            "ping" => (Ok(json!({})), Flow::Continue),
            "shutdown" => {
                info!(req_id, "Shutdown requested");
                (Ok(json!({"success": true})), Flow::Shutdown)
            }
            "tools/call" => match self.prepare_tool_call(&request.params) {
                Ok((tool, arguments)) => {
                    self.spawn_tool_call(req_id, request.id, tool, arguments, out, in_flight);
                    return Flow::Continue;
                }
                Err(e) => (Err(e), Flow::Continue),
            },
            _ => (Err(McpError::MethodNotFound(method.clone())), Flow::Continue),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let Some(id) = request.id else {
            if let Err(e) = outcome {
                warn!(req_id, method = %method, error = %e, "Notification handling failed");
            }
            return flow;
        };

        let response = match outcome {
            Ok(value) => {
                info!(req_id, method = %method, elapsed_ms, "Request completed successfully");
                JsonRpcResponse::success(id, value)
            }
            Err(e) => {
                warn!(req_id, method = %method, elapsed_ms, error = %e, "Request completed with error");
                JsonRpcResponse::error(id, e.into())
            }
        };
        out.send(req_id, &response).await;

        flow
    }

    fn handle_initialize(&self) -> Result<Value, McpError> {
        info!("MCP bridge initialized");
        serde_json::to_value(InitializeResult::default()).map_err(|e| McpError::Internal(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        serde_json::to_value(ToolsListResult::default()).map_err(|e| McpError::Internal(e.to_string()))
    }

    /// Validate `tools/call` params, returning the tool name and its arguments
    fn prepare_tool_call(&self, params: &Value) -> Result<(String, Value), McpError> {
        let name = params["name"]
            .as_str()
            .ok_or_else(|| McpError::InvalidParams("Missing 'name' parameter".into()))?;

        if resolve_tool_name(name).is_none() {
            return Err(McpError::UnknownTool(name.to_string()));
        }

        let arguments = params
            .get("parameters")
            .or_else(|| params.get("arguments"))
            .cloned()
            .unwrap_or(Value::Null);

        if !(arguments.is_object() || arguments.is_null()) {
            return Err(McpError::InvalidParams(
                "'parameters' must be an object".into(),
            ));
        }

        Ok((name.to_string(), arguments))
    }

    /// Relay a tool call in the background; the response is written when it completes
    fn spawn_tool_call<W>(
        &self,
        req_id: u64,
        id: Option<Value>,
        tool: String,
        arguments: Value,
        out: &ResponseWriter<W>,
        in_flight: &mut JoinSet<()>,
    ) where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let relay = self.relay.clone();
        let out = out.clone();

        info!(req_id, tool = %tool, "Dispatching tool call");
        debug!(req_id, tool = %tool, arguments = %arguments, "Tool call arguments");

        in_flight.spawn(async move {
            let result = relay.invoke(&tool, arguments).await;

            let Some(id) = id else {
                debug!(req_id, tool = %tool, "Tool call notification finished (no response)");
                return;
            };

            let response = match serde_json::to_string(&result) {
                Ok(encoded) => JsonRpcResponse::success(id, json!({ "result": encoded })),
                Err(e) => JsonRpcResponse::error(
                    id,
                    McpError::Internal(e.to_string()).into(),
                ),
            };
            out.send(req_id, &response).await;
        });
    }

    /// Give outstanding tool calls the grace period, then abort the rest
    async fn drain(&self, in_flight: &mut JoinSet<()>) {
        if in_flight.is_empty() {
            return;
        }

        info!(
            outstanding = in_flight.len(),
            grace_ms = self.options.shutdown_grace.as_millis() as u64,
            "Waiting for in-flight tool calls"
        );

        let wait_all = async {
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "Tool call task failed");
                }
            }
        };

        if tokio::time::timeout(self.options.shutdown_grace, wait_all)
            .await
            .is_err()
        {
            warn!(
                aborted = in_flight.len(),
                "Grace period elapsed, aborting remaining tool calls"
            );
            in_flight.abort_all();
            while in_flight.join_next().await.is_some() {}
        }
    }
}

/// Collect finished tool-call tasks without waiting
fn reap(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(e) = joined {
            warn!(error = %e, "Tool call task failed");
        }
    }
}

/// Parse a line into a request and its method
///
/// On failure returns the id to answer with (the request's own id when it
/// could be read, otherwise 0) and the error to report.
fn parse_request(line: &str) -> Result<(JsonRpcRequest, String), (Value, McpError)> {
    let value: Value = serde_json::from_str(line).map_err(|e| (json!(0), e.into()))?;

    let id = value
        .get("id")
        .filter(|id| !id.is_null())
        .cloned()
        .unwrap_or_else(|| json!(0));

    if !value.is_object() {
        return Err((
            id,
            McpError::Malformed("request must be a JSON object".into()),
        ));
    }

    let request: JsonRpcRequest =
        serde_json::from_value(value).map_err(|e| (id.clone(), e.into()))?;

    match request.method.clone() {
        Some(method) => Ok((request, method)),
        None => Err((id, McpError::MissingMethod)),
    }
}
