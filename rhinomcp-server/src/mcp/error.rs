//! MCP error types

use std::io;

use super::protocol::JsonRpcError;

/// Stdio endpoint errors
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// IO error (stdin/stdout)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line that is not valid JSON, or not a request object
    #[error("Internal error: {0}")]
    Malformed(String),

    /// Request object without a method
    #[error("Internal error: missing 'method'")]
    MissingMethod,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Malformed(err.to_string())
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        let code = match &err {
            McpError::MethodNotFound(_) | McpError::UnknownTool(_) => {
                JsonRpcError::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_) => JsonRpcError::INVALID_PARAMS,
            McpError::Io(_)
            | McpError::Malformed(_)
            | McpError::MissingMethod
            | McpError::Internal(_) => JsonRpcError::INTERNAL_ERROR,
        };
        JsonRpcError::new(code, err.to_string())
    }
}
