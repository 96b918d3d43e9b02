//! Recursive tree copy preserving modes and symlinks.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::{Error, Result};

/// Options for [`copy_tree`].
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Directory names skipped at any depth (e.g. `.git`).
    pub skip_dir_names: Vec<String>,
}

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created if missing. Symlinks are recreated as symlinks (never
/// followed); file permission bits are carried over on unix.
pub fn copy_tree(src: &Path, dst: &Path, opts: &CopyOptions) -> Result<()> {
    if !src.is_dir() {
        return Err(Error::NotADirectory {
            path: src.to_path_buf(),
        });
    }
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    let mut walker = WalkDir::new(src).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            Error::io(path, e.into())
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields children of src");
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let name = entry.file_name().to_string_lossy();
            if opts.skip_dir_names.iter().any(|s| s == name.as_ref()) {
                walker.skip_current_dir();
                continue;
            }
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            copy_permissions(entry.path(), &target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
            make_symlink(&link, &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| Error::io(&target, e))?;
        }
    }

    Ok(())
}

/// Move the contents of `src` under `dst` (rename, falling back to copy).
///
/// Used when promoting a content staging dir into the composite staging
/// tree; both normally live on the same filesystem so this is a rename.
pub fn move_tree(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_tree(src, dst, &CopyOptions::default())?;
            fs::remove_dir_all(src).map_err(|e| Error::io(src, e))?;
            Ok(())
        }
    }
}

fn copy_permissions(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| Error::io(src, e))?;
    fs::set_permissions(dst, meta.permissions()).map_err(|e| Error::io(dst, e))
}

#[cfg(unix)]
fn make_symlink(link: &Path, target: &Path) -> Result<()> {
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target).map_err(|e| Error::io(target, e))?;
    }
    std::os::unix::fs::symlink(link, target).map_err(|e| Error::io(target, e))
}

#[cfg(not(unix))]
fn make_symlink(link: &Path, target: &Path) -> Result<()> {
    // Windows symlink creation needs privileges; degrade to copying the
    // link target when it resolves, matching what most archive tools do.
    match fs::copy(link, target) {
        Ok(_) => Ok(()),
        Err(e) => Err(Error::io(target, e)),
    }
}
