//! Atomic directory replacement.
//!
//! Promotes a fully-assembled staging tree into its live location. Renames
//! are atomic on one filesystem; cross-device moves fall back to a
//! copy-then-swap with a sibling temp so the live path is never
//! half-written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::copy::{copy_tree, CopyOptions};
use crate::{Error, Result};

/// Replace the directory at `live` with the tree at `staged`.
///
/// On return, `live` holds exactly the staged contents and `staged` is gone.
/// The previous live tree, if any, is removed last so a failure mid-swap
/// leaves either the old or the new tree in place, never a mix.
pub fn replace_dir(live: &Path, staged: &Path) -> Result<()> {
    if let Some(parent) = live.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let displaced = sibling_temp(live);

    if live.exists() {
        fs::rename(live, &displaced).map_err(|e| Error::Replace {
            live: live.to_path_buf(),
            message: format!("moving previous contents aside: {}", e),
        })?;
    }

    let moved = match fs::rename(staged, live) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            // Staging lives on another filesystem; copy into a sibling and
            // swap that in so the final step is still a same-fs rename.
            let incoming = sibling_incoming(live);
            copy_tree(staged, &incoming, &CopyOptions::default())
                .and_then(|_| {
                    fs::rename(&incoming, live).map_err(|e| Error::Replace {
                        live: live.to_path_buf(),
                        message: format!("swapping staged copy in: {}", e),
                    })
                })
                .map(|_| {
                    let _ = fs::remove_dir_all(staged);
                })
        }
        Err(e) => Err(Error::Replace {
            live: live.to_path_buf(),
            message: format!("renaming staged tree in: {}", e),
        }),
    };

    if let Err(err) = moved {
        // Best effort: put the old tree back before surfacing the error.
        if displaced.exists() {
            let _ = fs::rename(&displaced, live);
        }
        return Err(err);
    }

    if displaced.exists() {
        fs::remove_dir_all(&displaced).map_err(|e| Error::io(&displaced, e))?;
    }

    Ok(())
}

fn is_cross_device(e: &std::io::Error) -> bool {
    // ErrorKind::CrossesDevices is still unstable on some toolchains; match
    // the raw errno as well.
    e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(libc_exdev())
}

const fn libc_exdev() -> i32 {
    18 // EXDEV on linux and macos
}

fn sibling_temp(live: &Path) -> PathBuf {
    decorate(live, "old")
}

fn sibling_incoming(live: &Path) -> PathBuf {
    decorate(live, "new")
}

fn decorate(live: &Path, tag: &str) -> PathBuf {
    let name = live
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dir".to_string());
    live.with_file_name(format!(".{}.vendo-{}-{}", name, tag, std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn replaces_missing_target() {
        let area = TempDir::new().unwrap();
        let staged = area.path().join("staged");
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("f"), "1").unwrap();

        let live = area.path().join("vendor/lib");
        replace_dir(&live, &staged).unwrap();

        assert_eq!(fs::read_to_string(live.join("f")).unwrap(), "1");
        assert!(!staged.exists());
    }

    #[test]
    fn replaces_existing_target_completely() {
        let area = TempDir::new().unwrap();
        let live = area.path().join("vendor");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join("stale"), "old").unwrap();

        let staged = area.path().join("staged");
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("fresh"), "new").unwrap();

        replace_dir(&live, &staged).unwrap();

        assert!(!live.join("stale").exists());
        assert_eq!(fs::read_to_string(live.join("fresh")).unwrap(), "new");
    }

    #[test]
    fn no_leftover_siblings() {
        let area = TempDir::new().unwrap();
        let live = area.path().join("vendor");
        fs::create_dir_all(&live).unwrap();

        let staged = area.path().join("staged");
        fs::create_dir_all(&staged).unwrap();

        replace_dir(&live, &staged).unwrap();

        let names: Vec<_> = fs::read_dir(area.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["vendor".to_string()]);
    }
}
