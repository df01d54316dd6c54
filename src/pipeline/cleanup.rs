// src/pipeline/cleanup.rs
use std::{fs, io::ErrorKind, path::PathBuf};
use tracing::{info, warn};

/// Best-effort removal of intermediate files. Returns how many were deleted;
/// failures are logged and otherwise ignored.
pub fn delete_files(paths: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                info!("deleted {}", path.display());
                deleted += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("file {} couldn't be found", path.display());
            }
            Err(e) => {
                warn!("failed to delete {}: {}", path.display(), e);
            }
        }
    }
    deleted
}
