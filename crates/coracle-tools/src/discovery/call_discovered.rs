//! Fallback invocation of discovered tools

use async_trait::async_trait;
use coracle_core::tools::{PROMOTED_TOOL_TTL, Tool, ToolArgs, ToolRegistry, ToolResult};
use serde_json::{Value, json};
use std::sync::{Arc, Weak};

/// Invoke a tool found through the search tools by passing its arguments
/// as a JSON string. Models that do not emit a direct call after a search
/// fall back to this.
pub struct CallDiscoveredTool {
    registry: Weak<ToolRegistry>,
}

impl CallDiscoveredTool {
    pub fn new(registry: &Arc<ToolRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

#[async_trait]
impl Tool for CallDiscoveredTool {
    fn name(&self) -> &str {
        "call_discovered_tool"
    }

    fn description(&self) -> &str {
        "Fallback tool. Execute a tool found via tool_search_tool by passing arguments as a JSON string."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool_name": {
                    "type": "string",
                },
                "arguments_json": {
                    "type": "string",
                },
            },
            "required": ["tool_name", "arguments_json"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(registry) = self.registry.upgrade() else {
            return ToolResult::error("tool registry is no longer available");
        };
        let Some(name) = args.get_str("tool_name") else {
            return ToolResult::error("tool_name is required");
        };
        let raw = args.get_str("arguments_json").unwrap_or_default();

        let parsed = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => return ToolResult::error(format!("invalid arguments_json format: {e}")),
        };
        let Some(forwarded) = ToolArgs::from_value(parsed) else {
            return ToolResult::error("invalid arguments_json format: expected a JSON object");
        };

        // Renew the TTL when the tool is used.
        registry.promote_tool(name, PROMOTED_TOOL_TTL);

        registry.execute(name, &forwarded).await
    }
}
