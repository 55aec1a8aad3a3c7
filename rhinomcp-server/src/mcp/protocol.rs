//! JSON-RPC and MCP protocol types
//!
//! Implements the JSON-RPC style messages exchanged with the assistant.

use rhinomcp_protocol::{tool_catalog, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version reported during capability negotiation
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during capability negotiation
pub const SERVER_NAME: &str = "RhinoMcpServer";

/// Incoming request
///
/// `method` is optional here so that a missing method can be reported as a
/// protocol error instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Request ID; absent or `null` for notifications
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name
    #[serde(default)]
    pub method: Option<String>,
    /// Method parameters (optional)
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that this response is for
    pub id: Value,
    /// Result (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // Standard JSON-RPC error codes
    /// Parse error (reserved; malformed lines are reported as INTERNAL_ERROR)
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request: The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found: The method (or tool) does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params: Invalid method parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server identity
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Advertised capabilities: the full tool catalog
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: &'static [ToolDescriptor],
}

/// Initialize response
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: &'static str,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            server_info: ServerInfo::default(),
            capabilities: ServerCapabilities {
                tools: tool_catalog(),
            },
        }
    }
}

/// Tools list response
#[derive(Debug, Serialize)]
pub struct ToolsListResult {
    pub tools: &'static [ToolDescriptor],
}

impl Default for ToolsListResult {
    fn default() -> Self {
        Self {
            tools: tool_catalog(),
        }
    }
}
