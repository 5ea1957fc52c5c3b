//! File-based locking to prevent overlapping backup runs

use anyhow::{Context, Result};
use fd_lock::RwLock;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Get the lock file path for a named run
pub fn lock_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bucket-backup-{}.lock", name))
}

/// Run `f` while holding an exclusive lock on `path`
///
/// Returns an error without running `f` if another process holds the lock.
/// The lock file is never removed, so every run locks the same inode.
pub fn with_lock_file<T>(path: &Path, f: impl FnOnce() -> T) -> Result<T> {
    debug!("Attempting to acquire lock: {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create lock directory")?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .context(format!("Failed to open lock file: {:?}", path))?;

    let mut lock = RwLock::new(file);
    let result = {
        let _guard = lock
            .try_write()
            .context(format!("Another backup run holds the lock: {:?}", path))?;

        info!("Acquired backup lock: {:?}", path);
        f()
    };

    info!("Released backup lock: {:?}", path);
    Ok(result)
}
