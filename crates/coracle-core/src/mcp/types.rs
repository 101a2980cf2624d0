//! Wire types for the MCP tool surface

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised by an MCP server in `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the arguments, passed through verbatim.
    #[serde(default)]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

/// Result of a `tools/call` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Concatenated text of all text-type content blocks. Non-text
    /// content is ignored.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for block in &self.content {
            if block.kind == "text" {
                text.push_str(&block.text);
                text.push('\n');
            }
        }
        text
    }
}

/// One content block in a tool result. `kind` is `"text"` or `"image"`;
/// only text blocks carry a payload this client consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}
