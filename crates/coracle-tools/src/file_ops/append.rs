//! Append to a file in the workspace

use super::workspace_fs;
use async_trait::async_trait;
use coracle_core::sandbox::{SandboxError, WorkspaceFs};
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppendFileTool {
    fs: Arc<dyn WorkspaceFs>,
}

impl AppendFileTool {
    pub fn new(workspace: impl Into<PathBuf>, restrict: bool) -> Self {
        Self {
            fs: workspace_fs(workspace.into(), restrict),
        }
    }
}

#[async_trait]
impl Tool for AppendFileTool {
    fn name(&self) -> &str {
        "append_file"
    }

    fn description(&self) -> &str {
        "Append content to the end of a file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to append to",
                },
                "content": {
                    "type": "string",
                    "description": "The content to append",
                },
            },
            "required": ["path", "content"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(path) = args.get_str("path") else {
            return ToolResult::error("path is required");
        };
        let Some(content) = args.get_str("content") else {
            return ToolResult::error("content is required");
        };

        match append_file(self.fs.as_ref(), path, content).await {
            Ok(()) => ToolResult::silent(format!("Appended to {path}")),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Read the existing content (a missing file counts as empty), append,
/// and write back atomically.
async fn append_file(fs: &dyn WorkspaceFs, path: &str, content: &str) -> Result<(), SandboxError> {
    let mut data = match fs.read_file(path).await {
        Ok(data) => data,
        Err(SandboxError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    data.extend_from_slice(content.as_bytes());
    fs.write_file(path, &data).await
}
