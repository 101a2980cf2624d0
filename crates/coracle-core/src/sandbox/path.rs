//! Workspace-relative path validation
//!
//! Guards every sandboxed file operation: a path is accepted only when
//! both its lexical form and its symlink-resolved form stay inside the
//! workspace. For paths that do not exist yet, the nearest existing
//! ancestor is resolved instead, so a write cannot be smuggled out
//! through a symlinked parent directory.

use super::error::SandboxError;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `workspace` and, when `restrict` is on, reject
/// anything that escapes the workspace after symlink resolution. Returns
/// the cleaned absolute path to operate on.
pub fn validate_path(
    path: &Path,
    workspace: &Path,
    restrict: bool,
) -> Result<PathBuf, SandboxError> {
    if workspace.as_os_str().is_empty() {
        return Err(SandboxError::WorkspaceUndefined);
    }

    let abs_workspace = absolutize(workspace)
        .map_err(|e| SandboxError::Io(format!("failed to resolve workspace path: {e}")))?;

    let abs_path = if path.is_absolute() {
        clean_path(path)
    } else {
        clean_path(&abs_workspace.join(path))
    };

    if !restrict {
        return Ok(abs_path);
    }

    if !abs_path.starts_with(&abs_workspace) {
        return Err(SandboxError::AccessDenied(
            "path is outside the workspace".into(),
        ));
    }

    // The lexical check above cannot see through symlinks; compare the
    // resolved forms too.
    let workspace_real = std::fs::canonicalize(&abs_workspace).unwrap_or(abs_workspace);

    match std::fs::canonicalize(&abs_path) {
        Ok(resolved) => {
            if !resolved.starts_with(&workspace_real) {
                return Err(SandboxError::AccessDenied(
                    "symlink resolves outside workspace".into(),
                ));
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let parent = abs_path.parent().unwrap_or(&abs_path);
            match resolve_existing_ancestor(parent) {
                Ok(resolved_parent) => {
                    if !resolved_parent.starts_with(&workspace_real) {
                        return Err(SandboxError::AccessDenied(
                            "symlink resolves outside workspace".into(),
                        ));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(SandboxError::Io(format!("failed to resolve path: {e}"))),
            }
        }
        Err(e) => return Err(SandboxError::Io(format!("failed to resolve path: {e}"))),
    }

    Ok(abs_path)
}

/// Walk up from `path` to the nearest existing ancestor and resolve its
/// symlinks.
fn resolve_existing_ancestor(path: &Path) -> io::Result<PathBuf> {
    let mut current = clean_path(path);
    loop {
        match std::fs::canonicalize(&current) {
            Ok(resolved) => return Ok(resolved),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent.to_path_buf(),
            _ => return Err(io::ErrorKind::NotFound.into()),
        }
    }
}

fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(clean_path(path))
    } else {
        Ok(clean_path(&std::env::current_dir()?.join(path)))
    }
}

/// Lexical normalization: drops `.` components and applies `..` without
/// touching the filesystem.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
