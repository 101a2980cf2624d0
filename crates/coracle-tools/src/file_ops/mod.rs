//! Workspace file tools
//!
//! Each tool operates through a [`WorkspaceFs`], so the same body serves
//! both the restricted (sandboxed) and unrestricted modes; the choice is
//! made once at construction.

mod append;
mod edit;
mod list_dir;
mod read;
mod write;

pub use append::AppendFileTool;
pub use edit::EditFileTool;
pub use list_dir::ListDirTool;
pub use read::ReadFileTool;
pub use write::WriteFileTool;

use coracle_core::sandbox::{HostFs, SandboxFs, WorkspaceFs};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) fn workspace_fs(workspace: PathBuf, restrict: bool) -> Arc<dyn WorkspaceFs> {
    if restrict {
        Arc::new(SandboxFs::new(workspace))
    } else {
        Arc::new(HostFs)
    }
}
