//! Per-request workspaces
//!
//! Every request gets its own directory `<work_root>/<uuid>`. The directory
//! is removed when the [`Workspace`] is closed or dropped, whichever happens
//! first, so cancelled and failed requests are cleaned up too.

use crate::config::absolute_path;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

/// Allocates workspaces under a shared root
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// A relative `root` is anchored at the current directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: absolute_path(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named workspace directory
    pub async fn open(&self) -> std::io::Result<Workspace> {
        tokio::fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4();
        let path = self.root.join(id.to_string());
        // create_dir (not create_dir_all) so an existing directory is never reused
        tokio::fs::create_dir(&path).await?;
        debug!("Opened workspace {}", path.display());

        Ok(Workspace {
            id,
            path,
            closed: AtomicBool::new(false),
        })
    }
}

/// An isolated directory owned by a single request
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    path: PathBuf,
    closed: AtomicBool,
}

impl Workspace {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace tree. Only the first close (or the drop) does
    /// any work.
    pub async fn close(&self) -> std::io::Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.removed(tokio::fs::remove_dir_all(&self.path).await)
    }

    /// Blocking variant for `Drop`, where there is nothing to await on
    fn close_now(&self) -> std::io::Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.removed(std::fs::remove_dir_all(&self.path))
    }

    fn removed(&self, result: std::io::Result<()>) -> std::io::Result<()> {
        match result {
            Ok(()) => {
                debug!("Removed workspace {}", self.id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.close_now() {
            warn!("Failed to remove workspace {}: {}", self.id, e);
        }
    }
}
