//! Sandbox error types

use thiserror::Error;

/// Errors from workspace path validation and sandboxed file operations.
///
/// Security rejections (`AccessDenied`) are kept distinct from ordinary
/// I/O failures so callers can surface a blocked-action message instead
/// of a generic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("workspace is not defined")]
    WorkspaceUndefined,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Io(String),
}

impl SandboxError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}
