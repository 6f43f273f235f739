//! Disk reading and modification-time probing.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};

/// Point in time a disk file was last modified.
pub type Timestamp = SystemTime;

/// Last modification time of a file, if it can be determined.
///
/// Missing files and platforms without mtime support both yield `None`;
/// callers treat that as "unknown", never as an error.
pub fn last_modified(path: &Path) -> Option<Timestamp> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Load a file from disk in full.
pub fn read_disk(path: &Path) -> VfsResult<Vec<u8>> {
    let not_found = || VfsError::not_found(path.display().to_string());

    let mut file = File::open(path).map_err(|_| not_found())?;
    let meta = file.metadata().map_err(|source| VfsError::SizeUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_dir() {
        return Err(not_found());
    }

    let mut buf = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
    file.read_to_end(&mut buf).map_err(|source| VfsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(buf)
}
