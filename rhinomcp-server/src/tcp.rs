//! Socket command server
//!
//! Accepts relay connections on loopback. Every connection carries exactly
//! one framed command and gets exactly one framed result before it is closed.

use std::net::SocketAddr;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use rhinomcp_protocol::{CodecError, CommandResult, ServerCodec};
use rhinomcp_utils::{Result, RhinoMcpError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;

/// TCP front end of the command dispatcher
pub struct CommandServer {
    listener: TcpListener,
    dispatcher: Dispatcher,
    max_message_bytes: usize,
}

impl CommandServer {
    /// Bind the listener
    ///
    /// Failing to bind is fatal; it is reported and never retried.
    pub async fn bind(addr: &str, dispatcher: Dispatcher, max_message_bytes: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind command server to {}: {}", addr, e);
            RhinoMcpError::Bind {
                addr: addr.to_string(),
                source: e,
            }
        })?;

        info!("Command server listening on {}", addr);

        Ok(Self {
            listener,
            dispatcher,
            max_message_bytes,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until a shutdown signal arrives
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(%peer, "New connection");
                            let dispatcher = self.dispatcher.clone();
                            let max = self.max_message_bytes;
                            tokio::spawn(async move {
                                handle_connection(stream, peer, dispatcher, max).await;
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping command server");
                    break;
                }
            }
        }
    }
}

/// Serve a single request/response exchange
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Dispatcher,
    max_message_bytes: usize,
) {
    let mut framed = Framed::new(stream, ServerCodec::with_max_size(max_message_bytes));

    let response = match framed.next().await {
        None => {
            debug!(%peer, "Client disconnected without sending a command");
            return;
        }
        Some(Err(CodecError::Io(e))) => {
            debug!(%peer, error = %e, "Connection dropped mid-frame");
            return;
        }
        Some(Err(e)) => {
            warn!(%peer, error = %e, "Rejecting malformed command");
            CommandResult::failure(format!("invalid command: {}", e))
        }
        Some(Ok(envelope)) => {
            let command = envelope.command_type.clone();
            let start = Instant::now();
            let result = dispatcher.dispatch(envelope).await;
            info!(
                %peer,
                command = %command,
                success = result.success,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Command handled"
            );
            result
        }
    };

    match framed.send(response).await {
        Ok(()) => {}
        Err(e @ CodecError::MessageTooLarge { .. }) => {
            // Nothing reached the buffer, so the connection can still carry a reply
            warn!(%peer, error = %e, "Result exceeds frame limit, replying with failure");
            let fallback = CommandResult::failure(format!("result too large: {}", e));
            if let Err(e) = framed.send(fallback).await {
                warn!(%peer, error = %e, "Failed to send result");
            }
        }
        Err(e) => {
            warn!(%peer, error = %e, "Failed to send result");
        }
    }
}
