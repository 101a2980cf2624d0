//! Root-confined filesystem operations with atomic writes

use super::error::SandboxError;
use super::path::validate_path;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// One directory entry as reported by [`WorkspaceFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// Reading, writing, and listing files, behind one interface so the
/// unrestricted and sandboxed implementations are interchangeable inside
/// the file tools.
#[async_trait]
pub trait WorkspaceFs: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, SandboxError>;

    /// Write the full contents of `path` atomically: readers observe
    /// either the previous contents or the new ones, never a mix.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), SandboxError>;

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntryInfo>, SandboxError>;
}

/// Unrestricted filesystem access on the host.
#[derive(Debug, Default)]
pub struct HostFs;

#[async_trait]
impl WorkspaceFs for HostFs {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, SandboxError> {
        read_file_at(Path::new(path)).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), SandboxError> {
        atomic_write(Path::new(path), data).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntryInfo>, SandboxError> {
        read_dir_at(Path::new(path)).await
    }
}

/// Filesystem confined to a workspace directory. Every operation
/// validates its path, symlinks included; there are no long-lived
/// handles to keep in sync.
#[derive(Debug)]
pub struct SandboxFs {
    workspace: PathBuf,
}

impl SandboxFs {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SandboxError> {
        validate_path(Path::new(path), &self.workspace, true)
    }
}

#[async_trait]
impl WorkspaceFs for SandboxFs {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, SandboxError> {
        let abs = self.resolve(path)?;
        read_file_at(&abs).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), SandboxError> {
        let abs = self.resolve(path)?;
        atomic_write(&abs, data).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntryInfo>, SandboxError> {
        let abs = self.resolve(path)?;
        read_dir_at(&abs).await
    }
}

async fn read_file_at(path: &Path) -> Result<Vec<u8>, SandboxError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(SandboxError::NotFound(path.display().to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(SandboxError::AccessDenied(path.display().to_string()))
        }
        Err(e) => Err(SandboxError::Io(format!("failed to read file: {e}"))),
    }
}

async fn read_dir_at(path: &Path) -> Result<Vec<DirEntryInfo>, SandboxError> {
    let mut reader = match tokio::fs::read_dir(path).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SandboxError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(SandboxError::Io(format!("failed to read directory: {e}"))),
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| SandboxError::Io(format!("failed to read directory: {e}")))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Write-then-rename. The target never exists in a truncated state: the
/// data lands in a unique temp file first and the rename replaces the
/// target in one step. The temp file is removed on any failure.
pub(crate) async fn atomic_write(target: &Path, data: &[u8]) -> Result<(), SandboxError> {
    if let Some(dir) = target.parent() {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| SandboxError::Io(format!("failed to create parent directories: {e}")))?;
        }
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let tmp = PathBuf::from(format!("{}.{nanos}.tmp", target.display()));

    if let Err(e) = tokio::fs::write(&tmp, data).await {
        remove_temp(&tmp).await;
        return Err(SandboxError::Io(format!("failed to write temp file: {e}")));
    }

    if let Err(e) = tokio::fs::rename(&tmp, target).await {
        remove_temp(&tmp).await;
        return Err(SandboxError::Io(format!(
            "failed to replace original file: {e}"
        )));
    }

    Ok(())
}

async fn remove_temp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("failed to clean up temp file {}: {e}", tmp.display());
        }
    }
}

/// Render directory entries the way the list tool reports them.
pub fn format_dir_entries(entries: &[DirEntryInfo]) -> String {
    let mut out = String::new();
    for entry in entries {
        if entry.is_dir {
            out.push_str("DIR:  ");
        } else {
            out.push_str("FILE: ");
        }
        out.push_str(&entry.name);
        out.push('\n');
    }
    out
}
