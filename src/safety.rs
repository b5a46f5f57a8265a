use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Caller-level path preconditions. These are checked before any file is
/// touched and are returned as errors rather than response envelopes.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("File path must be absolute: {}", .0.display())]
    NotAbsolute(PathBuf),

    #[error("Path traversal not allowed: {}", .0.display())]
    PathTraversal(PathBuf),

    #[error(
        "Path is outside workspace: {} (workspace: {})",
        .path.display(),
        .workspace.display()
    )]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

/// Reject relative paths and any path with a `..` component.
pub fn check_file_path(path: &Path) -> Result<(), SafetyError> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(SafetyError::PathTraversal(path.to_path_buf()));
    }
    if !path.is_absolute() {
        return Err(SafetyError::NotAbsolute(path.to_path_buf()));
    }
    Ok(())
}

/// Optional confinement of every edited path to one directory tree.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical path to workspace root
    workspace_root: PathBuf,
}

impl WorkspaceGuard {
    /// The workspace root is canonicalized to handle symlinks correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;
        Ok(Self { workspace_root })
    }

    /// Check that `path` resolves inside the workspace.
    ///
    /// The path does not have to exist yet: the closest existing ancestor is
    /// canonicalized and the remaining components are joined back on, which
    /// is sound because `..` components were rejected by [`check_file_path`].
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        check_file_path(path)?;

        let mut existing = path;
        let mut rest = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    rest.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }

        let mut resolved = existing.canonicalize()?;
        for name in rest.iter().rev() {
            resolved.push(name);
        }

        if !resolved.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: resolved,
                workspace: self.workspace_root.clone(),
            });
        }
        Ok(resolved)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}
