//! Write a file in the workspace

use super::workspace_fs;
use async_trait::async_trait;
use coracle_core::sandbox::WorkspaceFs;
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

pub struct WriteFileTool {
    fs: Arc<dyn WorkspaceFs>,
}

impl WriteFileTool {
    pub fn new(workspace: impl Into<PathBuf>, restrict: bool) -> Self {
        Self {
            fs: workspace_fs(workspace.into(), restrict),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to write",
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file",
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

        match self.fs.write_file(path, content.as_bytes()).await {
            Ok(()) => ToolResult::silent(format!("File written: {path}")),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
