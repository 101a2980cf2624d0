//! Remote MCP tools wrapped as local tools

use async_trait::async_trait;
use coracle_core::mcp::{McpClient, ToolDefinition};
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// One remote MCP tool presented through the local [`Tool`] contract.
///
/// The definition carries the namespaced name (`<alias>_<original>`), so
/// two providers exporting the same tool name never collide in the
/// registry; calls go out under the original server-side name. Adapters
/// are always deferred: remote tools do not occupy the initial catalog.
pub struct McpToolAdapter {
    client: Arc<dyn McpClient>,
    original_name: String,
    definition: ToolDefinition,
}

impl McpToolAdapter {
    pub fn new(
        client: Arc<dyn McpClient>,
        definition: ToolDefinition,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            original_name: original_name.into(),
            definition,
        }
    }

    /// The tool's name on the remote server.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn parameters(&self) -> Value {
        self.definition.input_schema.clone()
    }

    fn is_deferred(&self) -> bool {
        true
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        debug!(
            tool = self.name(),
            remote = %self.original_name,
            "executing mcp tool"
        );

        let result = match self
            .client
            .call_tool(&self.original_name, args.to_value())
            .await
        {
            Ok(result) => result,
            Err(e) => return ToolResult::error(format!("mcp call failed: {e}")).with_source(&e),
        };

        if result.is_error {
            return ToolResult::error(result.text_content());
        }

        ToolResult::text(result.text_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coracle_core::mcp::{CallToolResult, ContentBlock, ListToolsResult, McpError};
    use serde_json::json;

    struct ScriptedClient {
        result: CallToolResult,
    }

    #[async_trait]
    impl McpClient for ScriptedClient {
        async fn initialize(&self) -> Result<(), McpError> {
            Ok(())
        }

        async fn list_tools(&self) -> Result<ListToolsResult, McpError> {
            Ok(ListToolsResult::default())
        }

        async fn call_tool(&self, name: &str, _args: Value) -> Result<CallToolResult, McpError> {
            assert_eq!(name, "echo");
            Ok(self.result.clone())
        }

        async fn close(&self) {}
    }

    fn adapter(result: CallToolResult) -> McpToolAdapter {
        let definition = ToolDefinition {
            name: "alias_echo".into(),
            description: "echoes".into(),
            input_schema: json!({"type": "object"}),
        };
        McpToolAdapter::new(Arc::new(ScriptedClient { result }), definition, "echo")
    }

    #[test]
    fn adapter_is_namespaced_and_deferred() {
        let adapter = adapter(CallToolResult::default());
        assert_eq!(adapter.name(), "alias_echo");
        assert_eq!(adapter.original_name(), "echo");
        assert!(adapter.is_deferred());
    }

    #[tokio::test]
    async fn success_concatenates_text_blocks() {
        let adapter = adapter(CallToolResult {
            content: vec![ContentBlock::text("one"), ContentBlock::text("two")],
            is_error: false,
        });

        let result = adapter.execute(&ToolArgs::new()).await;
        assert!(!result.is_error);
        assert_eq!(result.for_llm, "one\ntwo\n");
    }

    #[tokio::test]
    async fn remote_error_flag_becomes_error_result() {
        let adapter = adapter(CallToolResult {
            content: vec![ContentBlock::text("remote failure detail")],
            is_error: true,
        });

        let result = adapter.execute(&ToolArgs::new()).await;
        assert!(result.is_error);
        assert_eq!(result.for_llm, "remote failure detail\n");
    }
}
