//! Tool registration helpers

use crate::discovery::register_discovery_tools;
use crate::file_ops::{AppendFileTool, EditFileTool, ListDirTool, ReadFileTool, WriteFileTool};
use coracle_core::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Which filesystem tools to expose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemToolsConfig {
    #[serde(default = "default_true")]
    pub enable_read: bool,
    #[serde(default = "default_true")]
    pub enable_write: bool,
    #[serde(default = "default_true")]
    pub enable_list: bool,
    #[serde(default = "default_true")]
    pub enable_edit: bool,
    #[serde(default = "default_true")]
    pub enable_append: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FilesystemToolsConfig {
    fn default() -> Self {
        Self {
            enable_read: true,
            enable_write: true,
            enable_list: true,
            enable_edit: true,
            enable_append: true,
        }
    }
}

/// Register the filesystem tools for one agent workspace. With `restrict`
/// on, every tool operates through the sandboxed filesystem.
pub fn setup_workspace_tools(
    registry: &ToolRegistry,
    workspace: &Path,
    restrict: bool,
    config: &FilesystemToolsConfig,
) {
    if config.enable_read {
        registry.register(Arc::new(ReadFileTool::new(workspace, restrict)));
    }
    if config.enable_write {
        registry.register(Arc::new(WriteFileTool::new(workspace, restrict)));
    }
    if config.enable_list {
        registry.register(Arc::new(ListDirTool::new(workspace, restrict)));
    }
    if config.enable_edit {
        registry.register(Arc::new(EditFileTool::new(workspace, restrict)));
    }
    if config.enable_append {
        registry.register(Arc::new(AppendFileTool::new(workspace, restrict)));
    }
}

/// Register the discovery meta-tools (regex search, BM25 search, and the
/// call-discovered fallback).
pub fn setup_discovery_tools(registry: &Arc<ToolRegistry>) {
    register_discovery_tools(registry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn registers_enabled_tools() {
        let registry = ToolRegistry::new();
        let ws = TempDir::new().unwrap();

        setup_workspace_tools(&registry, ws.path(), true, &FilesystemToolsConfig::default());
        assert_eq!(registry.len(), 5);
        assert!(registry.get("read_file").is_some());
        assert!(registry.get("edit_file").is_some());
    }

    #[test]
    fn respects_disabled_flags() {
        let registry = ToolRegistry::new();
        let ws = TempDir::new().unwrap();

        let config = FilesystemToolsConfig {
            enable_write: false,
            enable_append: false,
            ..Default::default()
        };
        setup_workspace_tools(&registry, ws.path(), true, &config);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("write_file").is_none());
    }

    #[test]
    fn discovery_tools_are_visible_not_deferred() {
        let registry = Arc::new(ToolRegistry::new());
        setup_discovery_tools(&registry);

        assert_eq!(registry.visible_tools().len(), 3);
        assert!(registry.get("tool_search_tool_bm25").is_some());
        assert!(registry.get("call_discovered_tool").is_some());
    }
}
