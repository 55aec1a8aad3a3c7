//! MCP stdio endpoint
//!
//! Speaks newline-delimited JSON-RPC with the assistant on stdin/stdout and
//! relays tool calls to the socket command server.

pub mod bridge;
pub mod error;
pub mod protocol;

pub use bridge::{BridgeOptions, McpBridge, RelayClient, RelayError};
pub use error::McpError;
