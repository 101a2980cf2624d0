//! MCP error types

use thiserror::Error;

/// Errors surfaced by the MCP client layer.
#[derive(Debug, Error)]
pub enum McpError {
    /// Malformed provider configuration (unknown kind, missing command or
    /// URL, duplicate alias).
    #[error("invalid mcp configuration: {0}")]
    Config(String),

    /// The transport failed: spawn error, connection failure, HTTP
    /// non-2xx, wrong SSE content type.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer spoke something that is not valid JSON-RPC, or the
    /// protocol handshake did not complete.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An error object carried from the peer.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The client was closed while the request was outstanding, or the
    /// request was issued after close.
    #[error("client closed")]
    Closed,
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
