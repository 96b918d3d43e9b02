//! Atomic file I/O.
//!
//! The lock file is the one piece of on-disk state two vendo invocations
//! can race on, so writes stage through a uniquely-named temp file and
//! serialize on an advisory lock held on the destination itself.

use std::fs;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Write `content` to `path`, replacing it atomically.
///
/// The content lands in a `NamedTempFile` in the destination's directory
/// (same filesystem, so the final rename is atomic) and is persisted over
/// `path`. An exclusive advisory lock on the destination is held across
/// the swap; a second invocation rewriting the same file blocks on the
/// gate instead of interleaving its rename with ours. The gate releases
/// when the handle drops, and temp-file cleanup on failure is the
/// `NamedTempFile` guard's job.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let dir = parent.unwrap_or_else(|| Path::new("."));

    let gate = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    gate.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    staged
        .write_all(content)
        .map_err(|e| Error::io(staged.path(), e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(staged.path(), e))?;
    staged.persist(path).map_err(|e| Error::io(path, e.error))?;

    Ok(())
}
