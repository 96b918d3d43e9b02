//! Per-directory assembly: stage each content in isolation, filter it,
//! merge it into a composite staging tree, then atomically replace the
//! live directory.

use std::fs;
use std::path::Path;

use vendo_config::{DirectoryConfig, LockContent, LockDirectory};
use vendo_fetch::{for_source, FetchContext, RefFetcher};
use vendo_fs::copy::move_tree;
use vendo_fs::path::scoped_join;
use vendo_fs::{replace, TempArea};

use crate::error::{Error, Result};
use crate::filter::{remove_matching, PathFilter};

/// How one directory should be synced.
pub struct DirectorySyncOpts<'a> {
    /// Refuse network resolution of unpinned identifiers.
    pub locked: bool,
    /// This directory's previous lock record, if any.
    pub lock: Option<&'a LockDirectory>,
}

/// Sync one configured directory; returns its fresh lock record.
///
/// A failure on content N abandons the whole composite staging tree; the
/// live directory is only touched by the final atomic replacement.
pub fn sync_directory(
    config_root: &Path,
    dir: &DirectoryConfig,
    opts: &DirectorySyncOpts<'_>,
    ref_fetcher: &dyn RefFetcher,
    temp: &TempArea,
) -> Result<LockDirectory> {
    let staging = temp.new_temp_dir(&format!("dir-{}", dir.path))?;
    let live = scoped_join(config_root, &dir.path)?;

    let mut contents = Vec::with_capacity(dir.contents.len());

    for content in &dir.contents {
        let lock_info = stage_content(config_root, dir, content, &staging, &live, opts, ref_fetcher, temp)
            .map_err(|e| e.in_content(&dir.path, &content.path))?;
        contents.push(LockContent::new(&content.path, lock_info));
    }

    tracing::info!(directory = %dir.path, "replacing directory");
    replace::replace_dir(&live, &staging).map_err(|e| Error::from(e).in_directory(&dir.path))?;

    if let Some(mode) = dir.permissions {
        apply_permissions(&live, mode).map_err(|e| e.in_directory(&dir.path))?;
    }

    Ok(LockDirectory {
        path: dir.path.clone(),
        contents,
    })
}

#[allow(clippy::too_many_arguments)]
fn stage_content(
    config_root: &Path,
    dir: &DirectoryConfig,
    content: &vendo_config::ContentConfig,
    staging: &Path,
    live: &Path,
    opts: &DirectorySyncOpts<'_>,
    ref_fetcher: &dyn RefFetcher,
    temp: &TempArea,
) -> Result<vendo_config::SourceLock> {
    let source = content.source()?;

    let locked_content = if opts.locked {
        Some(
            opts.lock
                .ok_or_else(|| Error::MissingLockDirectory {
                    directory: dir.path.clone(),
                })?
                .find_content(&content.path)
                .ok_or_else(|| Error::MissingLockContent {
                    directory: dir.path.clone(),
                    content: content.path.clone(),
                })?,
        )
    } else {
        None
    };

    tracing::info!(
        directory = %dir.path,
        content = %content.path,
        kind = source.kind(),
        locked = opts.locked,
        "fetching content"
    );

    let content_staging = temp.new_temp_dir(&format!("content-{}", content.path))?;

    let existing_content_dir = if content.path == "." {
        Some(live.to_path_buf())
    } else {
        scoped_join(live, &content.path).ok()
    };

    let ctx = FetchContext {
        config_root,
        existing_content_dir,
        ref_fetcher,
    };

    let fetcher = for_source(source, locked_content, &ctx)?;
    let lock_info = fetcher.retrieve(&content_staging, temp)?;

    PathFilter::from_content(content)?.apply(&content_staging)?;
    remove_matching(&content_staging, &content.ignore_paths)?;

    merge_into(&content_staging, staging, &content.path)?;

    Ok(lock_info)
}

/// Move a filtered content tree under the composite staging tree at its
/// sub-path. Sub-path disjointness is validated up front; an existing
/// destination here means that guarantee broke.
fn merge_into(content_staging: &Path, staging: &Path, sub_path: &str) -> Result<()> {
    if sub_path == "." {
        for entry in fs::read_dir(content_staging).map_err(|e| Error::io(content_staging, e))? {
            let entry = entry.map_err(|e| Error::io(content_staging, e))?;
            let target = staging.join(entry.file_name());
            if target.symlink_metadata().is_ok() {
                return Err(Error::StagingConflict {
                    path: entry.file_name().to_string_lossy().into_owned(),
                });
            }
            fs::rename(entry.path(), &target).map_err(|e| Error::io(&target, e))?;
        }
        return Ok(());
    }

    let dest = scoped_join(staging, sub_path)?;
    if dest.symlink_metadata().is_ok() {
        return Err(Error::StagingConflict {
            path: sub_path.to_string(),
        });
    }
    move_tree(content_staging, &dest)?;
    Ok(())
}

#[cfg(unix)]
fn apply_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn apply_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
