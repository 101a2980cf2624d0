//! List a workspace directory

use super::workspace_fs;
use async_trait::async_trait;
use coracle_core::sandbox::{WorkspaceFs, format_dir_entries};
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

pub struct ListDirTool {
    fs: Arc<dyn WorkspaceFs>,
}

impl ListDirTool {
    pub fn new(workspace: impl Into<PathBuf>, restrict: bool) -> Self {
        Self {
            fs: workspace_fs(workspace.into(), restrict),
        }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories in a path"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to list",
                },
            },
            "required": ["path"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let path = args.get_str("path").unwrap_or(".");

        match self.fs.read_dir(path).await {
            Ok(entries) => ToolResult::text(format_dir_entries(&entries)),
            Err(e) => ToolResult::error(format!("failed to read directory: {e}")),
        }
    }
}
