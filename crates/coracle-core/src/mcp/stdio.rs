//! Subprocess MCP client speaking newline-delimited JSON over stdio

use super::client::{McpClient, call_tool_params, initialize_params};
use super::error::McpError;
use super::protocol::{JsonRpcMessage, MAX_FRAME_BYTES, RequestTracker, dispatch_frame, methods};
use super::types::{CallToolResult, ListToolsResult};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// MCP client over a spawned subprocess.
///
/// Frames are one JSON object per line on stdout, capped at
/// [`MAX_FRAME_BYTES`]; stderr is passed through for diagnostics. A
/// background reader routes responses to their pending slots, so any
/// number of requests can be in flight on the single pipe.
pub struct StdioClient {
    child: Mutex<Child>,
    stdin: Mutex<Option<ChildStdin>>,
    tracker: Arc<RequestTracker>,
    cancel: CancellationToken,
}

impl StdioClient {
    /// Spawn the server process and bind its pipes. `env` entries overlay
    /// the inherited environment.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            McpError::Transport(format!("failed to spawn mcp server '{command}': {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("failed to get stdin handle".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("failed to get stdout handle".into()))?;

        let tracker = Arc::new(RequestTracker::new());
        let cancel = CancellationToken::new();

        tokio::spawn(read_loop(stdout, Arc::clone(&tracker), cancel.clone()));

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(Some(stdin)),
            tracker,
            cancel,
        })
    }

    async fn write_line(&self, line: &str) -> Result<(), McpError> {
        let mut stdin = self.stdin.lock().await;
        let stdin = stdin.as_mut().ok_or(McpError::Closed)?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| McpError::Transport(format!("failed to write request: {e}")))?;
        stdin
            .write_all(b"\n")
            .await
            .map_err(|e| McpError::Transport(format!("failed to write request: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| McpError::Transport(format!("failed to write request: {e}")))?;
        Ok(())
    }

    pub(crate) async fn send_request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<JsonRpcMessage, McpError> {
        if self.cancel.is_cancelled() {
            return Err(McpError::Closed);
        }

        let id = self.tracker.next_id();
        let request = JsonRpcMessage::request(&id, method, params);
        let line = serde_json::to_string(&request)?;

        // The slot guard removes the pending entry on every exit path,
        // including a failed write below and caller drop.
        let slot = self.tracker.register(&id);
        self.write_line(&line).await?;

        slot.recv(&self.cancel).await
    }
}

async fn read_loop(stdout: ChildStdout, tracker: Arc<RequestTracker>, cancel: CancellationToken) {
    // The codec enforces the frame cap while reading, so a peer that
    // never sends a newline cannot grow the buffer past the limit.
    let mut frames = FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_FRAME_BYTES));
    loop {
        match frames.next().await {
            Some(Ok(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JsonRpcMessage>(line) {
                    Ok(msg) => dispatch_frame(&tracker, msg),
                    Err(e) => error!("failed to decode json-rpc frame: {e}"),
                }
            }
            Some(Err(e)) => {
                error!("error reading mcp server stdout: {e}");
                break;
            }
            None => {
                debug!("mcp server stdout closed");
                break;
            }
        }
    }
    // A dead transport completes every pending and future request with
    // a closed error.
    cancel.cancel();
}

#[async_trait]
impl McpClient for StdioClient {
    async fn initialize(&self) -> Result<(), McpError> {
        self.send_request(methods::INITIALIZE, initialize_params())
            .await?;

        let notification = serde_json::to_string(&JsonRpcMessage::notification(methods::INITIALIZED))?;
        self.write_line(&notification).await
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
        self.cancel.cancel();

        // Dropping stdin sends EOF so the child can exit on its own.
        self.stdin.lock().await.take();

        let mut child = self.child.lock().await;
        tokio::select! {
            _ = child.wait() => {}
            _ = tokio::time::sleep(Duration::from_secs(5)) => {
                let _ = child.kill().await;
            }
        }
    }
}
