//! Stateless HTTP MCP client
//!
//! One POST per call; the response is parsed synchronously from the POST
//! body. No background reader, no pending table, nothing to close.

use super::client::{
    McpClient, build_header_map, call_tool_params, initialize_params, truncated_body,
};
use super::error::McpError;
use super::protocol::{JsonRpcMessage, methods};
use super::types::{CallToolResult, ListToolsResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, USER_AGENT};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use url::Url;

// Permissive headers so WAF-fronted servers accept the requests.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// MCP client for stateless (REST-style) servers.
pub struct HttpClient {
    url: Url,
    headers: HeaderMap,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpClient {
    pub fn new(url: &str, headers: &HashMap<String, String>) -> Result<Self, McpError> {
        let url = Url::parse(url)
            .map_err(|e| McpError::Config(format!("invalid http url '{url}': {e}")))?;
        Ok(Self {
            url,
            headers: build_header_map(headers),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(0),
        })
    }

    fn request_builder(&self) -> reqwest::RequestBuilder {
        self.http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .headers(self.headers.clone())
    }

    pub(crate) async fn send_request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<JsonRpcMessage, McpError> {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let request = JsonRpcMessage::request(&id, method, params);

        let resp = self.request_builder().json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = truncated_body(resp).await;
            return Err(McpError::Transport(format!("http error {status}: {body}")));
        }

        let mut msg: JsonRpcMessage = resp
            .json()
            .await
            .map_err(|e| McpError::Protocol(format!("invalid json response: {e}")))?;

        if let Some(err) = msg.error.take() {
            return Err(McpError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(msg)
    }
}

#[async_trait]
impl McpClient for HttpClient {
    async fn initialize(&self) -> Result<(), McpError> {
        self.send_request(methods::INITIALIZE, initialize_params())
            .await?;

        // The protocol asks for 'notifications/initialized' after a
        // successful initialize; on a stateless transport it is
        // fire-and-forget.
        let builder = self.request_builder();
        tokio::spawn(async move {
            let notification = JsonRpcMessage::notification(methods::INITIALIZED);
            if let Err(e) = builder.json(&notification).send().await {
                debug!("initialized notification failed: {e}");
            }
        });

        Ok(())
    }

    async fn list_tools(&self) -> Result<ListToolsResult, McpError> {
        self.send_request(methods::TOOLS_LIST, json!({}))
            .await?
            .decode_result()
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, McpError> {
        self.send_request(methods::TOOLS_CALL, call_tool_params(name, args))
            .await?
            .decode_result()
    }

    async fn close(&self) {
        // Stateless: there is no connection to release.
    }
}
