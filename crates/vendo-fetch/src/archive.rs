//! Archive extraction by content sniff.
//!
//! Supports tar, tar+gzip, and zip. Extraction preserves file modes and
//! symlinks; entry paths and symlink targets that would escape the
//! extraction root are rejected.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// Recognized archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    TarGz,
    Zip,
}

/// Determine the archive format from magic bytes.
pub fn sniff(path: &Path) -> Result<ArchiveKind> {
    let mut file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let mut head = [0u8; 4];
    let n = file.read(&mut head).map_err(|e| Error::io(path, e))?;

    if n >= 2 && head[0] == 0x1f && head[1] == 0x8b {
        return Ok(ArchiveKind::TarGz);
    }
    if n >= 4 && &head[..4] == b"PK\x03\x04" {
        return Ok(ArchiveKind::Zip);
    }

    // Plain tar carries "ustar" at offset 257.
    let mut magic = [0u8; 5];
    file.seek(SeekFrom::Start(257)).map_err(|e| Error::io(path, e))?;
    if file.read(&mut magic).map_err(|e| Error::io(path, e))? == 5 && &magic == b"ustar" {
        return Ok(ArchiveKind::Tar);
    }

    Err(Error::UnknownArchiveFormat)
}

/// Extract the archive at `path` into `dst`.
pub fn extract(path: &Path, kind: ArchiveKind, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    match kind {
        ArchiveKind::Tar => {
            let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
            extract_tar(file, dst)
        }
        ArchiveKind::TarGz => {
            let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
            extract_tar(GzDecoder::new(file), dst)
        }
        ArchiveKind::Zip => extract_zip(path, dst),
    }
}

fn extract_tar<R: Read>(reader: R, dst: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| Error::Archive {
            message: e.to_string(),
        })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| Error::Archive {
            message: e.to_string(),
        })?;

        let raw_path = entry
            .path()
            .map_err(|e| Error::Archive {
                message: e.to_string(),
            })?
            .into_owned();
        let rel = safe_relative_path(&raw_path)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(&rel);

        if entry.header().entry_type().is_symlink() {
            let link = entry
                .link_name()
                .map_err(|e| Error::Archive {
                    message: e.to_string(),
                })?
                .ok_or_else(|| Error::Archive {
                    message: format!("symlink entry '{}' has no target", rel.display()),
                })?;
            check_link_in_root(&rel, &link)?;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        entry.unpack(&target).map_err(|e| Error::Archive {
            message: format!("unpacking '{}': {}", rel.display(), e),
        })?;
    }

    Ok(())
}

fn extract_zip(path: &Path, dst: &Path) -> Result<()> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::Archive {
        message: e.to_string(),
    })?;

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(|e| Error::Archive {
            message: e.to_string(),
        })?;

        let rel = safe_relative_path(Path::new(entry.name()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mode = entry.unix_mode();

        if mode.map(|m| m & 0o170000 == 0o120000).unwrap_or(false) {
            // Symlink entries store their target as the file body.
            let mut link = String::new();
            entry.read_to_string(&mut link).map_err(|e| Error::Archive {
                message: e.to_string(),
            })?;
            check_link_in_root(&rel, Path::new(&link))?;
            make_symlink(Path::new(&link), &target)?;
            continue;
        }

        let mut out = fs::File::create(&target).map_err(|e| Error::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Error::io(&target, e))?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| Error::io(&target, e))?;
        }
    }

    Ok(())
}

/// Normalize an archive entry path, rejecting absolute paths and `..`.
fn safe_relative_path(raw: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => {
                return Err(Error::ArchiveEntryEscapes {
                    entry: raw.to_string_lossy().into_owned(),
                })
            }
        }
    }
    Ok(out)
}

/// Reject symlink targets that resolve outside the extraction root.
///
/// Checked lexically: starting from the entry's directory depth, `..`
/// components may not climb past the root.
fn check_link_in_root(entry_rel: &Path, link: &Path) -> Result<()> {
    if link.is_absolute() {
        return Err(Error::ArchiveEntryEscapes {
            entry: entry_rel.to_string_lossy().into_owned(),
        });
    }

    let mut depth = entry_rel.components().count() as i64 - 1;
    for component in link.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::ArchiveEntryEscapes {
                        entry: entry_rel.to_string_lossy().into_owned(),
                    });
                }
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::ArchiveEntryEscapes {
                    entry: entry_rel.to_string_lossy().into_owned(),
                })
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(link: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link, target).map_err(|e| Error::io(target, e))
}

#[cfg(not(unix))]
fn make_symlink(_link: &Path, target: &Path) -> Result<()> {
    Err(Error::Archive {
        message: format!("symlink extraction unsupported on this platform: {}", target.display()),
    })
}
