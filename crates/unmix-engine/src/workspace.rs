//! Per-request temporary workspaces.
//!
//! Every separation request gets an exclusively-owned scratch directory
//! that holds the uploaded input and the external tool's output tree. The
//! tool writes large, possibly sensitive audio data there, so the directory
//! must be removed on every exit path: explicit cleanup, TTL eviction, an
//! error mid-processing, or an unwind.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// Prefix for workspace directory names.
const WORKSPACE_PREFIX: &str = "unmix-";

/// Creates per-request scratch directories.
///
/// Two acquisitions never share a directory; uniqueness comes from
/// `tempfile`'s randomized naming.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    /// Parent directory for workspaces. `None` uses the system temp dir.
    root: Option<PathBuf>,
}

impl WorkspaceManager {
    /// Manager that places workspaces in the system temp directory.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Manager that places workspaces under `root`, creating it on demand.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Create a fresh, uniquely-named workspace directory.
    ///
    /// Failures (no disk space, permissions) are fatal for the request.
    pub fn acquire(&self) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(EngineError::Workspace)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(EngineError::Workspace)?;

        // Take ownership of the path; deletion is managed explicitly from
        // here on so the reaper and cleanup endpoint control its lifetime.
        let path = dir.keep();
        debug!(path = %path.display(), "Workspace acquired");

        Ok(Workspace {
            path,
            released: false,
        })
    }
}

/// An exclusively-owned temporary directory for one separation attempt.
///
/// Dropping an unreleased workspace removes the directory best-effort; call
/// [`Workspace::release`] where removal errors need to be observed.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively delete the directory.
    ///
    /// Idempotent: a second release, or a release after the directory
    /// already disappeared, is a no-op rather than an error.
    pub async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(EngineError::Workspace(e)),
        }
        self.released = true;
        debug!(path = %self.path.display(), "Workspace released");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove workspace on drop");
            }
        }
    }
}
