//! SSE MCP client: a long-lived event stream plus POSTed requests
//!
//! The transport has two legs. A GET opens a `text/event-stream`; the
//! server's first event, `event: endpoint`, announces the URL requests
//! must be POSTed to. Responses never come back on the POST -- they
//! arrive later as events on the stream and are correlated by id.

use super::client::{
    McpClient, build_header_map, call_tool_params, initialize_params, truncated_body,
};
use super::error::McpError;
use super::protocol::{
    JsonRpcMessage, MAX_FRAME_BYTES, RequestTracker, dispatch_frame, methods,
};
use super::types::{CallToolResult, ListToolsResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, USER_AGENT};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;

/// How long the handshake waits for the server's `endpoint` event.
pub const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(15);

const CLIENT_USER_AGENT: &str = concat!("coracle/", env!("CARGO_PKG_VERSION"));

/// MCP client over an SSE stream with POSTed requests.
#[derive(Debug)]
pub struct SseClient {
    http: reqwest::Client,
    headers: HeaderMap,
    post_url: watch::Receiver<Option<Url>>,
    tracker: Arc<RequestTracker>,
    cancel: CancellationToken,
}

impl SseClient {
    /// Open the event stream and wait for the `endpoint` event.
    pub async fn connect(url: &str, headers: &HashMap<String, String>) -> Result<Self, McpError> {
        Self::connect_with_timeout(url, headers, ENDPOINT_TIMEOUT).await
    }

    /// [`connect`](Self::connect) with an explicit handshake deadline.
    pub async fn connect_with_timeout(
        url: &str,
        headers: &HashMap<String, String>,
        handshake_timeout: Duration,
    ) -> Result<Self, McpError> {
        let base = Url::parse(url)
            .map_err(|e| McpError::Config(format!("invalid sse url '{url}': {e}")))?;
        let custom_headers = build_header_map(headers);
        let http = reqwest::Client::new();

        let resp = http
            .get(base.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .headers(custom_headers.clone())
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("failed to connect to sse endpoint: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = truncated_body(resp).await;
            return Err(McpError::Transport(format!(
                "unexpected status code {status} from sse endpoint. Body: {body}"
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/event-stream") {
            let body = truncated_body(resp).await;
            return Err(McpError::Transport(format!(
                "server did not return an sse stream (got {content_type}). Response: {body}"
            )));
        }

        let tracker = Arc::new(RequestTracker::new());
        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = watch::channel(None);

        tokio::spawn(read_loop(
            Box::pin(resp.bytes_stream()),
            base,
            ready_tx,
            Arc::clone(&tracker),
            cancel.clone(),
        ));

        let client = Self {
            http,
            headers: custom_headers,
            post_url: ready_rx,
            tracker,
            cancel,
        };

        let handshake = tokio::time::timeout(handshake_timeout, client.wait_endpoint()).await;
        match handshake {
            Ok(Ok(url)) => {
                debug!(%url, "sse client ready");
                Ok(client)
            }
            Ok(Err(_)) => {
                client.cancel.cancel();
                Err(McpError::Transport(
                    "sse stream closed before the 'endpoint' event".into(),
                ))
            }
            Err(_) => {
                client.cancel.cancel();
                Err(McpError::Protocol(format!(
                    "timeout ({}s) waiting for 'endpoint' event from remote sse server",
                    handshake_timeout.as_secs()
                )))
            }
        }
    }

    /// Wait until the server has announced the POST endpoint. Requests
    /// issued before the `endpoint` event block here.
    async fn wait_endpoint(&self) -> Result<Url, McpError> {
        let mut rx = self.post_url.clone();
        loop {
            if let Some(url) = rx.borrow_and_update().clone() {
                return Ok(url);
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(McpError::Closed),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Err(McpError::Closed);
                    }
                }
            }
        }
    }

    pub(crate) async fn send_request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<JsonRpcMessage, McpError> {
        if self.cancel.is_cancelled() {
            return Err(McpError::Closed);
        }
        let post_url = self.wait_endpoint().await?;

        let id = self.tracker.next_id();
        let request = JsonRpcMessage::request(&id, method, params);

        // Guard installed before the POST: a failed send drops it.
        let slot = self.tracker.register(&id);

        let resp = self
            .http
            .post(post_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            let body = truncated_body(resp).await;
            return Err(McpError::Transport(format!(
                "POST request failed with status {status}. Server says: {body}"
            )));
        }

        // The POST body is empty; the reply arrives on the stream.
        slot.recv(&self.cancel).await
    }
}

async fn read_loop(
    mut stream: impl futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
    base: Url,
    ready: watch::Sender<Option<Url>>,
    tracker: Arc<RequestTracker>,
    cancel: CancellationToken,
) {
    let mut buf = String::new();
    let mut event = String::new();
    let mut data = String::new();

    'outer: loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => break,
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                if let Ok(text) = std::str::from_utf8(&bytes) {
                    buf.push_str(text);
                }
                if buf.len() > MAX_FRAME_BYTES {
                    error!(bytes = buf.len(), "oversized sse event");
                    break;
                }
                while let Some(pos) = buf.find('\n') {
                    let line = buf[..pos].trim_end_matches('\r').to_string();
                    buf.drain(..=pos);
                    if handle_line(&line, &mut event, &mut data, &base, &ready, &tracker).is_err() {
                        break 'outer;
                    }
                }
            }
            Some(Err(e)) => {
                error!("error reading sse stream: {e}");
                break;
            }
            None => {
                debug!("sse stream ended");
                break;
            }
        }
    }
    cancel.cancel();
}

/// Accumulate one line of the event stream; a blank line terminates the
/// current event and routes it.
fn handle_line(
    line: &str,
    event: &mut String,
    data: &mut String,
    base: &Url,
    ready: &watch::Sender<Option<Url>>,
    tracker: &RequestTracker,
) -> Result<(), ()> {
    if line.is_empty() {
        if event.as_str() == "endpoint" {
            match base.join(data.trim()) {
                Ok(url) => {
                    debug!(%url, "sse endpoint announced");
                    // send fails only when the client is gone.
                    if ready.send(Some(url)).is_err() {
                        return Err(());
                    }
                }
                Err(e) => error!("invalid endpoint url '{data}': {e}"),
            }
        } else if !data.is_empty() {
            match serde_json::from_str::<JsonRpcMessage>(data) {
                Ok(msg) => dispatch_frame(tracker, msg),
                Err(e) => error!("failed to decode sse json-rpc frame: {e}"),
            }
        }
        event.clear();
        data.clear();
    } else if let Some(rest) = line.strip_prefix("event:") {
        *event = rest.trim().to_string();
    } else if let Some(rest) = line.strip_prefix("data:") {
        data.push_str(rest.trim());
    }
    // Comment lines and unknown fields are ignored.
    Ok(())
}

#[async_trait]
impl McpClient for SseClient {
    async fn initialize(&self) -> Result<(), McpError> {
        self.send_request(methods::INITIALIZE, initialize_params())
            .await?;

        // Best-effort: the protocol wants the notification, but a server
        // that rejects it is still usable.
        let post_url = self.wait_endpoint().await?;
        let http = self.http.clone();
        let headers = self.headers.clone();
        tokio::spawn(async move {
            let notification = JsonRpcMessage::notification(methods::INITIALIZED);
            let result = http
                .post(post_url)
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .header(USER_AGENT, CLIENT_USER_AGENT)
                .headers(headers)
                .json(&notification)
                .send()
                .await;
            match result {
                Ok(resp)
                    if resp.status() != StatusCode::OK
                        && resp.status() != StatusCode::ACCEPTED =>
                {
                    warn!(status = %resp.status(), "initialized notification rejected");
                }
                Ok(_) => {}
                Err(e) => warn!("initialized notification failed: {e}"),
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
        // Terminates the reader and unblocks every pending awaiter.
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while buf.len() < pos + 4 + content_length {
                    let n = stream.read(&mut tmp).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&tmp[..n]);
                }
                break;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn extract_id(request: &str) -> String {
        let start = request.find("\"id\":\"").unwrap() + 6;
        let end = request[start..].find('"').unwrap();
        request[start..start + end].to_string()
    }

    async fn respond_accepted(stream: &mut TcpStream) {
        stream
            .write_all(b"HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn endpoint_race_then_initialize() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            // The SSE stream connection.
            let (mut sse, _) = listener.accept().await.unwrap();
            read_request(&mut sse).await;
            sse.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\n\r\n",
            )
            .await
            .unwrap();

            // Announce the endpoint only after a delay: the client must
            // block until it arrives.
            tokio::time::sleep(Duration::from_millis(100)).await;
            sse.write_all(b"event: endpoint\ndata: /rpc\n\n").await.unwrap();

            // The initialize POST.
            let (mut post, _) = listener.accept().await.unwrap();
            let request = read_request(&mut post).await;
            assert!(request.starts_with("POST /rpc"));
            assert!(request.contains("initialize"));
            let id = extract_id(&request);
            respond_accepted(&mut post).await;

            // Reply on the stream.
            let event = format!(
                "event: message\ndata: {{\"jsonrpc\":\"2.0\",\"id\":\"{id}\",\"result\":{{}}}}\n\n"
            );
            sse.write_all(event.as_bytes()).await.unwrap();

            // The fire-and-forget initialized notification.
            if let Ok(Ok((mut post, _))) =
                tokio::time::timeout(Duration::from_secs(2), listener.accept()).await
            {
                let request = read_request(&mut post).await;
                assert!(request.contains("notifications/initialized"));
                respond_accepted(&mut post).await;
            }

            // Keep the stream open until the client drops.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(sse);
        });

        let client = SseClient::connect(&format!("http://{addr}"), &HashMap::new())
            .await
            .unwrap();
        client.initialize().await.unwrap();
        client.close().await;
        server.abort();
    }

    #[tokio::test]
    async fn missing_endpoint_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sse, _) = listener.accept().await.unwrap();
            read_request(&mut sse).await;
            sse.write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n")
                .await
                .unwrap();
            // A comment is not an endpoint event.
            sse.write_all(b": ping\n\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = SseClient::connect_with_timeout(
            &format!("http://{addr}"),
            &HashMap::new(),
            Duration::from_millis(300),
        )
        .await;

        match result {
            Err(McpError::Protocol(msg)) => assert!(msg.contains("'endpoint'"), "{msg}"),
            other => panic!("expected protocol timeout, got {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn wrong_content_type_fails_fast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sse, _) = listener.accept().await.unwrap();
            read_request(&mut sse).await;
            sse.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 16\r\n\r\n<html>nope</html",
            )
            .await
            .unwrap();
        });

        let result = SseClient::connect(&format!("http://{addr}"), &HashMap::new()).await;
        match result {
            Err(McpError::Transport(msg)) => {
                assert!(msg.contains("did not return an sse stream"), "{msg}");
                assert!(msg.contains("nope"), "{msg}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn non_200_fails_fast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sse, _) = listener.accept().await.unwrap();
            read_request(&mut sse).await;
            sse.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot found")
                .await
                .unwrap();
        });

        let result = SseClient::connect(&format!("http://{addr}"), &HashMap::new()).await;
        match result {
            Err(McpError::Transport(msg)) => assert!(msg.contains("unexpected status code"), "{msg}"),
            other => panic!("expected transport error, got {other:?}"),
        }
        server.abort();
    }

    #[test]
    fn endpoint_resolution_relative_and_absolute() {
        let base = Url::parse("http://example.com/sse").unwrap();
        assert_eq!(base.join("/rpc").unwrap().as_str(), "http://example.com/rpc");
        assert_eq!(
            base.join("http://other.com/msg").unwrap().as_str(),
            "http://other.com/msg"
        );
    }
}
