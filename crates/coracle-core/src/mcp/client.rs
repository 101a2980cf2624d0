//! The unified client interface for MCP servers

use super::error::McpError;
use super::protocol::PROTOCOL_VERSION;
use super::types::{CallToolResult, ListToolsResult};
use async_trait::async_trait;
use serde_json::{Value, json};

/// A live connection to an MCP server, local or remote.
///
/// All three transports (subprocess stdio, SSE + POST, stateless HTTP)
/// present the same surface; the manager and tool adapters never care
/// which one they hold.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// Perform the MCP handshake: the `initialize` request followed by
    /// the `notifications/initialized` notification.
    async fn initialize(&self) -> Result<(), McpError>;

    /// Enumerate the tools the server exposes.
    async fn list_tools(&self) -> Result<ListToolsResult, McpError>;

    /// Invoke a tool by its server-side name.
    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, McpError>;

    /// Release the connection. Pending requests complete with
    /// [`McpError::Closed`].
    async fn close(&self);
}

/// Handshake parameters shared by every transport.
pub(crate) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": "coracle",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {},
    })
}

/// `tools/call` parameters.
pub(crate) fn call_tool_params(name: &str, args: Value) -> Value {
    json!({
        "name": name,
        "arguments": args,
    })
}

/// Convert configured header pairs into a reqwest header map, skipping
/// pairs that are not valid HTTP header material.
pub(crate) fn build_header_map(
    headers: &std::collections::HashMap<String, String>,
) -> reqwest::header::HeaderMap {
    let mut map = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::try_from(key.as_str()),
            reqwest::header::HeaderValue::try_from(value.as_str()),
        ) {
            map.insert(name, value);
        }
    }
    map
}

/// Read at most 2 KiB of a response body for inclusion in error messages.
pub(crate) async fn truncated_body(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    text.chars().take(2048).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_params_shape() {
        let params = initialize_params();
        assert_eq!(params["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(params["clientInfo"]["name"], "coracle");
        assert!(params["capabilities"].as_object().unwrap().is_empty());
    }
}
