//! Read a file from the workspace

use super::workspace_fs;
use async_trait::async_trait;
use coracle_core::sandbox::WorkspaceFs;
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

pub struct ReadFileTool {
    fs: Arc<dyn WorkspaceFs>,
}

impl ReadFileTool {
    pub fn new(workspace: impl Into<PathBuf>, restrict: bool) -> Self {
        Self {
            fs: workspace_fs(workspace.into(), restrict),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to read",
                },
            },
            "required": ["path"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(path) = args.get_str("path") else {
            return ToolResult::error("path is required");
        };

        match self.fs.read_file(path).await {
            Ok(content) => ToolResult::text(String::from_utf8_lossy(&content).into_owned()),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
