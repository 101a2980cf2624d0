//! Exact-match file editing

use super::workspace_fs;
use async_trait::async_trait;
use coracle_core::sandbox::{SandboxError, WorkspaceFs};
use coracle_core::tools::{Tool, ToolArgs, ToolResult};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

/// Replace `old_text` with `new_text` in a file. The old text must occur
/// exactly once, which forces the model to provide enough context to make
/// the edit unambiguous.
pub struct EditFileTool {
    fs: Arc<dyn WorkspaceFs>,
}

impl EditFileTool {
    pub fn new(workspace: impl Into<PathBuf>, restrict: bool) -> Self {
        Self {
            fs: workspace_fs(workspace.into(), restrict),
        }
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Edit a file by replacing old_text with new_text. The old_text must exist exactly in the file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to edit",
                },
                "old_text": {
                    "type": "string",
                    "description": "The exact text to find and replace",
                },
                "new_text": {
                    "type": "string",
                    "description": "The text to replace with",
                },
            },
            "required": ["path", "old_text", "new_text"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(path) = args.get_str("path") else {
            return ToolResult::error("path is required");
        };
        let Some(old_text) = args.get_str("old_text") else {
            return ToolResult::error("old_text is required");
        };
        let Some(new_text) = args.get_str("new_text") else {
            return ToolResult::error("new_text is required");
        };

        match edit_file(self.fs.as_ref(), path, old_text, new_text).await {
            Ok(()) => ToolResult::silent(format!("File edited: {path}")),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Read, replace, and atomically write back. The same body serves both
/// restricted and unrestricted modes through the filesystem interface.
async fn edit_file(
    fs: &dyn WorkspaceFs,
    path: &str,
    old_text: &str,
    new_text: &str,
) -> Result<(), SandboxError> {
    let content = fs.read_file(path).await?;
    let content = String::from_utf8_lossy(&content);

    let new_content = replace_edit_content(&content, old_text, new_text)
        .map_err(SandboxError::Io)?;

    fs.write_file(path, new_content.as_bytes()).await
}

/// Replace a single occurrence of `old_text`, rejecting ambiguity.
pub(crate) fn replace_edit_content(
    content: &str,
    old_text: &str,
    new_text: &str,
) -> Result<String, String> {
    if !content.contains(old_text) {
        return Err("old_text not found in file. Make sure it matches exactly".to_string());
    }

    let count = content.matches(old_text).count();
    if count > 1 {
        return Err(format!(
            "old_text appears {count} times. Please provide more context to make it unique"
        ));
    }

    Ok(content.replacen(old_text, new_text, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_single_occurrence() {
        let result = replace_edit_content("hello world", "world", "rust").unwrap();
        assert_eq!(result, "hello rust");
    }

    #[test]
    fn missing_text_is_rejected() {
        let err = replace_edit_content("hello", "absent", "x").unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn ambiguous_text_is_rejected() {
        let err = replace_edit_content("aa bb aa", "aa", "x").unwrap_err();
        assert!(err.contains("2 times"));
    }
}
