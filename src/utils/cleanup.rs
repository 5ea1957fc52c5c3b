//! Best-effort removal of local backup artifacts

use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Remove each path: files directly, directories recursively
///
/// Errors are logged and swallowed; missing paths are ignored.
pub fn clean_up<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        let result = if path.is_file() {
            fs::remove_file(path).map(|_| info!("Removed file: {:?}", path))
        } else if path.is_dir() {
            fs::remove_dir_all(path).map(|_| info!("Removed directory: {:?}", path))
        } else {
            Ok(())
        };

        if let Err(e) = result {
            warn!("Failed to clean up {:?}: {}", path, e);
        }
    }
}

/// Remove `dir` only if it exists and has no entries
///
/// Returns true when the directory was removed.
pub fn remove_if_empty(dir: &Path) -> bool {
    let is_empty = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => {
            warn!("Cannot inspect backup directory {:?}: {}", dir, e);
            return false;
        }
    };

    if !is_empty {
        info!("Backup directory not empty, keeping: {:?}", dir);
        return false;
    }

    match fs::remove_dir(dir) {
        Ok(()) => {
            info!("Removed empty backup directory: {:?}", dir);
            true
        }
        Err(e) => {
            warn!("Failed to remove backup directory {:?}: {}", dir, e);
            false
        }
    }
}
