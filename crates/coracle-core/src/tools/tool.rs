//! The tool capability contract

use super::result::ToolResult;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

/// Arguments passed to a tool, decoded from the model's JSON tool call.
///
/// Tools validate shape at entry with the typed accessors; missing or
/// mistyped keys are reported as error results, not panics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a decoded JSON value; anything other than an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The arguments as a JSON object, for forwarding over the wire.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(str::to_string)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ToolArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A callable capability exposed to the model.
///
/// Implementations provide a stable unique name, a human-readable
/// description, a JSON Schema for their parameters, and the execution
/// body. Failures are reported through the returned [`ToolResult`], never
/// through a panic or an `Err`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable unique name, e.g. `read_file`.
    fn name(&self) -> &str;

    /// Description used by the model to pick the tool.
    fn description(&self) -> &str;

    /// JSON Schema object for the arguments, passed to the model verbatim.
    fn parameters(&self) -> Value;

    /// Run the tool. Deadlines are the caller's responsibility: wrap the
    /// returned future in `tokio::time::timeout` to bound a call.
    async fn execute(&self, args: &ToolArgs) -> ToolResult;

    /// Deferred tools are withheld from the initial model-facing catalog
    /// and only surface after being found via a search tool.
    fn is_deferred(&self) -> bool {
        false
    }

    /// Model-facing schema projection.
    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            },
        })
    }
}
