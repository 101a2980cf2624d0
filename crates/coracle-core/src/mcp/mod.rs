//! MCP client layer
//!
//! Speaks JSON-RPC 2.0 to tool providers over three transports: a local
//! subprocess (newline-delimited JSON on stdio), a server-sent-events
//! stream with POSTed requests, and stateless HTTP. All three multiplex
//! concurrent requests over one connection and present the same
//! [`McpClient`] surface.

mod client;
mod config;
mod error;
mod http;
mod protocol;
mod sse;
mod stdio;
mod types;

pub use client::McpClient;
pub use config::{McpConfig, ServerConfig, TransportKind};
pub use error::McpError;
pub use http::HttpClient;
pub use protocol::{JSONRPC_VERSION, JsonRpcMessage, MAX_FRAME_BYTES, PROTOCOL_VERSION, RpcError, methods};
pub use sse::{ENDPOINT_TIMEOUT, SseClient};
pub use stdio::StdioClient;
pub use types::{CallToolResult, ContentBlock, ListToolsResult, ToolDefinition};
