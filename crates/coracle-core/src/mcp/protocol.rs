//! JSON-RPC 2.0 framing shared by the MCP clients
//!
//! One envelope type covers requests, responses, and notifications; the
//! populated fields decide which it is. Ids are decimal strings drawn
//! from a per-client atomic counter, and the [`RequestTracker`] correlates
//! out-of-order responses back to their callers through capacity-one
//! rendezvous slots.

use super::error::McpError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision sent in the initialize handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Frames larger than this are treated as a broken peer.
pub const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

/// MCP method names.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// The JSON-RPC envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcMessage {
    pub fn request(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: Some(method.into()),
            params: None,
            result: None,
            error: None,
        }
    }

    /// Decode the `result` payload, treating a missing result as `null`.
    pub fn decode_result<T: serde::de::DeserializeOwned>(self) -> Result<T, McpError> {
        serde_json::from_value(self.result.unwrap_or(Value::Null))
            .map_err(|e| McpError::Protocol(format!("failed to decode result: {e}")))
    }
}

/// Error object carried inside a JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

#[derive(Default, Debug)]
struct PendingTable {
    slots: Mutex<HashMap<String, oneshot::Sender<JsonRpcMessage>>>,
}

/// Id generation and response correlation for one client.
///
/// Ids are strictly monotonic within the client; responses may arrive in
/// any order and are routed purely by id.
#[derive(Default, Debug)]
pub(crate) struct RequestTracker {
    next_id: AtomicU64,
    pending: Arc<PendingTable>,
}

impl RequestTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Install a rendezvous slot for an outstanding request. The returned
    /// guard removes the slot when dropped, whatever the exit path: a
    /// failed transport write, caller cancellation, or normal completion
    /// all release the entry.
    pub(crate) fn register(&self, id: &str) -> PendingSlot {
        let (tx, rx) = oneshot::channel();
        self.pending.slots.lock().insert(id.to_string(), tx);
        PendingSlot {
            id: id.to_string(),
            table: Arc::clone(&self.pending),
            rx,
        }
    }

    /// Route a response to its waiting slot. Late responses for removed
    /// ids are dropped.
    pub(crate) fn dispatch(&self, msg: JsonRpcMessage) {
        let Some(id) = msg.id.clone() else {
            return;
        };
        let sender = self.pending.slots.lock().remove(&id);
        match sender {
            Some(tx) => {
                let _ = tx.send(msg);
            }
            None => debug!(%id, "response for unknown or expired request id"),
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.slots.lock().len()
    }
}

/// Route an inbound frame: responses go to the tracker, notifications are
/// logged and discarded.
pub(crate) fn dispatch_frame(tracker: &RequestTracker, msg: JsonRpcMessage) {
    if msg.id.is_some() {
        tracker.dispatch(msg);
    } else if let Some(method) = &msg.method {
        debug!(%method, "received notification");
    }
}

/// One-shot delivery slot for a single outstanding request.
pub(crate) struct PendingSlot {
    id: String,
    table: Arc<PendingTable>,
    rx: oneshot::Receiver<JsonRpcMessage>,
}

impl PendingSlot {
    /// Wait for the response, the client's shutdown, or caller drop.
    /// A response carrying an `error` object becomes [`McpError::Rpc`].
    pub(crate) async fn recv(mut self, cancel: &CancellationToken) -> Result<JsonRpcMessage, McpError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(McpError::Closed),
            msg = &mut self.rx => match msg {
                Ok(mut msg) => match msg.error.take() {
                    Some(err) => Err(McpError::Rpc {
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(msg),
                },
                Err(_) => Err(McpError::Closed),
            },
        }
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.table.slots.lock().remove(&self.id);
    }
}
