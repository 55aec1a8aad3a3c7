//! Relay client
//!
//! Opens one TCP connection per tool call, sends the command envelope, waits
//! for the single result and closes the connection. Nothing is retried here.

use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use rhinomcp_protocol::{
    strip_namespace, ClientCodec, CodecError, CommandEnvelope, CommandResult, MAX_MESSAGE_SIZE,
};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default reply timeout
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport failure, tagged with the phase it happened in
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("connection timed out")]
    ConnectTimeout,

    #[error("connection failed: {0}")]
    Connect(std::io::Error),

    #[error("failed to send command: {0}")]
    Send(CodecError),

    #[error("timed out after {0:?} waiting for the host to reply")]
    ReadTimeout(Duration),

    #[error("connection closed before the host replied")]
    ConnectionClosed,

    #[error("invalid reply from host: {0}")]
    Reply(CodecError),
}

impl From<RelayError> for CommandResult {
    fn from(err: RelayError) -> Self {
        CommandResult::failure(err.to_string())
    }
}

/// Per-call TCP client for the socket command server
#[derive(Debug, Clone)]
pub struct RelayClient {
    addr: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_message_bytes: usize,
}

impl RelayClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            max_message_bytes: MAX_MESSAGE_SIZE,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            addr: config.bridge.addr(),
            connect_timeout: config.bridge.connect_timeout(),
            read_timeout: config.bridge.read_timeout(),
            max_message_bytes: config.limits.max_message_bytes,
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Invoke a tool on the host
    ///
    /// Transport failures come back as unsuccessful results, never as errors.
    pub async fn invoke(&self, tool_name: &str, params: Value) -> CommandResult {
        let operation = strip_namespace(tool_name);
        let envelope = CommandEnvelope::from_value(operation, params);

        let start = Instant::now();
        let outcome = self.round_trip(envelope).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                info!(
                    tool = %tool_name,
                    operation = %operation,
                    success = result.success,
                    elapsed_ms,
                    "Relay call completed"
                );
                result
            }
            Err(e) => {
                warn!(
                    tool = %tool_name,
                    operation = %operation,
                    addr = %self.addr,
                    error = %e,
                    elapsed_ms,
                    "Relay call failed"
                );
                e.into()
            }
        }
    }

    async fn round_trip(&self, envelope: CommandEnvelope) -> Result<CommandResult, RelayError> {
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(RelayError::Connect(e)),
            Err(_) => return Err(RelayError::ConnectTimeout),
        };
        debug!(addr = %self.addr, "Connected to command server");

        let mut framed = Framed::new(stream, ClientCodec::with_max_size(self.max_message_bytes));

        let exchange = async {
            framed.send(envelope).await.map_err(RelayError::Send)?;
            match framed.next().await {
                Some(Ok(result)) => Ok(result),
                Some(Err(e)) => Err(RelayError::Reply(e)),
                None => Err(RelayError::ConnectionClosed),
            }
        };

        // The connection is dropped (and closed) on every path out of here
        timeout(self.read_timeout, exchange)
            .await
            .map_err(|_| RelayError::ReadTimeout(self.read_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhinomcp_protocol::ServerCodec;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Accept one connection and answer it with `reply`
    async fn one_shot_server(reply: CommandResult) -> (String, tokio::task::JoinHandle<CommandEnvelope>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, ServerCodec::new());
            let envelope = framed.next().await.unwrap().unwrap();
            framed.send(reply).await.unwrap();
            envelope
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_invoke_strips_namespace() {
        let (addr, server) = one_shot_server(CommandResult::ok(json!({"objectCount": 0}))).await;

        let result = RelayClient::new(addr)
            .invoke("scene_tools.get_scene_info", json!({}))
            .await;

        assert!(result.success);
        let envelope = server.await.unwrap();
        assert_eq!(envelope.command_type, "get_scene_info");
        assert!(envelope.params.is_empty());
    }

    #[tokio::test]
    async fn test_host_failure_passes_through() {
        let (addr, _server) = one_shot_server(CommandResult::failure("no active document")).await;

        let result = RelayClient::new(addr)
            .invoke("geometry_tools.create_sphere", json!({"radius": 5}))
            .await;

        assert_eq!(result.error_message(), Some("no active document"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_phase_error() {
        // Grab a free port, then release it so nothing is listening
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let start = Instant::now();
        let result = RelayClient::new(addr)
            .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
            .invoke("scene_tools.get_scene_info", json!({}))
            .await;

        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("connection failed"));
    }

    #[tokio::test]
    async fn test_read_timeout_is_distinct() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _hung = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            // Never reply
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let result = RelayClient::new(addr)
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(200))
            .invoke("scene_tools.clear_scene", json!({}))
            .await;

        let message = result.error.unwrap();
        assert_ne!(message, "connection timed out");
        assert!(message.contains("waiting for the host to reply"));
    }

    #[tokio::test]
    async fn test_peer_closing_early() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, ServerCodec::new());
            let _ = framed.next().await;
        });

        let result = RelayClient::new(addr)
            .invoke("scene_tools.get_scene_info", json!({}))
            .await;
        assert_eq!(
            result.error_message(),
            Some("connection closed before the host replied")
        );
    }

    #[test]
    fn test_connect_timeout_message() {
        let result: CommandResult = RelayError::ConnectTimeout.into();
        assert_eq!(result.error_message(), Some("connection timed out"));
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.bridge.port = 9999;
        config.bridge.read_timeout_secs = 45;
        let client = RelayClient::from_config(&config);
        assert_eq!(client.addr(), "127.0.0.1:9999");
        assert_eq!(client.read_timeout, Duration::from_secs(45));
    }
}
