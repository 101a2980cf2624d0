//! Workspace sandboxing for file-editing tools
//!
//! Two guarantees shared by every file tool: paths cannot escape the
//! workspace (symlinks included), and writes are atomic, so readers never
//! observe a truncated file.

mod error;
mod fs;
mod path;

pub use error::SandboxError;
pub use fs::{DirEntryInfo, HostFs, SandboxFs, WorkspaceFs, format_dir_entries};
pub use path::validate_path;
