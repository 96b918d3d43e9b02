//! Top-level sync driver: iterates configured directories in declared
//! order, collects lock records, and produces the new lock document.

use std::path::Path;

use vendo_config::{ConfigSet, LockConfig};
use vendo_fetch::ResourceRefFetcher;
use vendo_fs::{io::write_atomic, TempArea};

use crate::dir_sync::{sync_directory, DirectorySyncOpts};
use crate::error::{Error, Result};

/// Options for one sync invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Refuse network resolution of unpinned identifiers; consume the lock
    /// verbatim.
    pub locked: bool,
    /// Restrict the sync to these directory paths. `None` syncs everything.
    pub directories: Option<Vec<String>>,
}

/// Sync every selected directory and return the new lock document.
///
/// Directories are processed sequentially in declared order. On a
/// directory failure, previously-synced directories are not rolled back
/// and no lock is returned; partial progress stays on disk and the error
/// names where it stopped.
pub fn sync(
    config_root: &Path,
    set: &ConfigSet,
    previous_lock: Option<&LockConfig>,
    opts: &SyncOptions,
) -> Result<LockConfig> {
    if opts.locked && previous_lock.is_none() {
        return Err(Error::MissingLockFile);
    }

    if let Some(selected) = &opts.directories {
        for path in selected {
            if set.config.find_directory(path).is_none() {
                return Err(Error::UnknownDirectory { path: path.clone() });
            }
        }
    }

    let ref_fetcher = ResourceRefFetcher::new(set);
    let temp = TempArea::new()?;

    // Start from the previous lock so directories outside a subset
    // restriction keep their records.
    let mut new_lock = match previous_lock {
        Some(lock) => lock.clone(),
        None => LockConfig::new(),
    };

    for dir in &set.config.directories {
        let selected = opts
            .directories
            .as_ref()
            .map(|list| list.iter().any(|p| p == &dir.path))
            .unwrap_or(true);
        if !selected {
            tracing::debug!(directory = %dir.path, "skipping (not selected)");
            continue;
        }

        let dir_opts = DirectorySyncOpts {
            locked: opts.locked,
            lock: previous_lock.and_then(|l| l.find_directory(&dir.path)),
        };

        tracing::info!(directory = %dir.path, "syncing directory");
        let dir_lock = sync_directory(config_root, dir, &dir_opts, &ref_fetcher, &temp)
            .map_err(|e| e.in_directory(&dir.path))?;
        new_lock.upsert_directory(dir_lock);
    }

    // The lock mirrors the config: declared order, configured paths only.
    let order: Vec<&str> = set.config.directories.iter().map(|d| d.path.as_str()).collect();
    new_lock
        .directories
        .retain(|d| order.contains(&d.path.as_str()));
    new_lock
        .directories
        .sort_by_key(|d| order.iter().position(|p| *p == d.path).unwrap_or(usize::MAX));

    Ok(new_lock)
}

/// Atomically write the lock document to `path`.
pub fn write_lock_file(path: &Path, lock: &LockConfig) -> Result<()> {
    let yaml = lock.to_yaml_string()?;
    write_atomic(path, yaml.as_bytes())?;
    Ok(())
}
