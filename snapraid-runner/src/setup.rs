// File: snapraid-runner/src/setup.rs
//
// One-time filesystem preparation at process start
//
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkStatus {
    Created,
    AlreadyExists,
    Failed,
}

/// Create `link` pointing at `source`. Failures are logged, never returned.
pub async fn ensure_config_symlink(source: &Path, link: &Path) -> SymlinkStatus {
    match tokio::fs::symlink(source, link).await {
        Ok(()) => {
            debug!(
                "Symlink created successfully: {} -> {}",
                link.display(),
                source.display()
            );
            SymlinkStatus::Created
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            warn!("Symlink already exists: {}", link.display());
            SymlinkStatus::AlreadyExists
        }
        Err(e) => {
            error!(
                "Error creating symlink {} -> {}: {}",
                link.display(),
                source.display(),
                e
            );
            SymlinkStatus::Failed
        }
    }
}
