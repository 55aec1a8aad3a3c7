//! rhinomcp-server: socket command server and MCP stdio bridge
//!
//! The `serve` side owns the modeling host behind a single document worker
//! and answers framed commands on loopback TCP. The `mcp-bridge` side speaks
//! JSON-RPC with the assistant on stdio and relays each tool call over its
//! own short-lived TCP connection.

pub mod config;
pub mod dispatch;
pub mod host;
pub mod mcp;
pub mod signal;
pub mod tcp;

pub use config::{AppConfig, ConfigLoader};
pub use dispatch::{Dispatcher, DocumentWorker};
pub use host::{HostCommand, HostError, MemoryDocumentHost, ModelingHost};
pub use mcp::{BridgeOptions, McpBridge, McpError, RelayClient, RelayError};
pub use tcp::CommandServer;
