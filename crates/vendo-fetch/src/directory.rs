//! Local-tree fetchers: `directory` copies a declared path, `manual`
//! carries the currently-live content forward through the swap.

use std::path::{Path, PathBuf};

use vendo_config::lock::SourceLock;
use vendo_config::sources::DirectorySource;
use vendo_fs::copy::{copy_tree, CopyOptions};
use vendo_fs::{path::scoped_join, TempArea};

use crate::error::{Error, Result};
use crate::Fetcher;

/// Copies a config-root-relative directory into the staging tree.
pub struct DirectoryFetcher<'a> {
    opts: &'a DirectorySource,
    config_root: &'a Path,
}

impl<'a> DirectoryFetcher<'a> {
    pub fn new(opts: &'a DirectorySource, config_root: &'a Path) -> Self {
        Self { opts, config_root }
    }
}

impl Fetcher for DirectoryFetcher<'_> {
    fn retrieve(&self, dst: &Path, _temp: &TempArea) -> Result<SourceLock> {
        if self.opts.path.is_empty() {
            return Err(Error::validation("directory", "expected non-empty path"));
        }

        let src = scoped_join(self.config_root, &self.opts.path)?;
        if !src.is_dir() {
            return Err(Error::validation(
                format!("directory '{}'", self.opts.path),
                "expected an existing directory",
            ));
        }

        let opts = CopyOptions {
            skip_dir_names: vec![".git".to_string()],
        };
        copy_tree(&src, dst, &opts)?;

        Ok(SourceLock::Directory)
    }
}

/// Stages whatever already lives at the content's target sub-path so
/// user-managed files survive the directory swap. First syncs, where
/// nothing exists yet, stage empty.
pub struct ManualFetcher {
    existing: Option<PathBuf>,
}

impl ManualFetcher {
    pub fn new(existing: Option<PathBuf>) -> Self {
        Self { existing }
    }
}

impl Fetcher for ManualFetcher {
    fn retrieve(&self, dst: &Path, _temp: &TempArea) -> Result<SourceLock> {
        std::fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

        match &self.existing {
            Some(src) if src.is_dir() => {
                copy_tree(src, dst, &CopyOptions::default())?;
            }
            Some(src) => {
                tracing::warn!(
                    path = %src.display(),
                    "manual content has nothing to preserve yet"
                );
            }
            None => {}
        }

        Ok(SourceLock::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn directory_copies_tree_without_git_dir() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("src/patches/.git")).unwrap();
        fs::write(root.path().join("src/patches/.git/HEAD"), "ref").unwrap();
        fs::write(root.path().join("src/patches/fix.patch"), "diff").unwrap();

        let opts = DirectorySource {
            path: "src/patches".to_string(),
        };
        let fetcher = DirectoryFetcher::new(&opts, root.path());

        let temp = TempArea::new().unwrap();
        let dst = temp.new_temp_dir("dst").unwrap();
        let lock = fetcher.retrieve(&dst, &temp).unwrap();

        assert_eq!(lock, SourceLock::Directory);
        assert!(dst.join("fix.patch").is_file());
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn directory_missing_source_is_error() {
        let root = TempDir::new().unwrap();
        let opts = DirectorySource {
            path: "nope".to_string(),
        };
        let fetcher = DirectoryFetcher::new(&opts, root.path());

        let temp = TempArea::new().unwrap();
        let dst = temp.new_temp_dir("dst").unwrap();
        assert!(fetcher.retrieve(&dst, &temp).is_err());
    }

    #[test]
    fn directory_escaping_path_is_error() {
        let root = TempDir::new().unwrap();
        let opts = DirectorySource {
            path: "../outside".to_string(),
        };
        let fetcher = DirectoryFetcher::new(&opts, root.path());

        let temp = TempArea::new().unwrap();
        let dst = temp.new_temp_dir("dst").unwrap();
        assert!(fetcher.retrieve(&dst, &temp).is_err());
    }

    #[test]
    fn manual_preserves_existing_content() {
        let root = TempDir::new().unwrap();
        let existing = root.path().join("vendor/patches");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("local.txt"), "mine").unwrap();

        let fetcher = ManualFetcher::new(Some(existing));
        let temp = TempArea::new().unwrap();
        let dst = temp.new_temp_dir("dst").unwrap();
        let lock = fetcher.retrieve(&dst, &temp).unwrap();

        assert_eq!(lock, SourceLock::Manual);
        assert_eq!(fs::read_to_string(dst.join("local.txt")).unwrap(), "mine");
    }

    #[test]
    fn manual_first_sync_stages_empty() {
        let root = TempDir::new().unwrap();
        let fetcher = ManualFetcher::new(Some(root.path().join("vendor/patches")));

        let temp = TempArea::new().unwrap();
        let dst = temp.new_temp_dir("dst").unwrap();
        fetcher.retrieve(&dst, &temp).unwrap();

        assert!(fs::read_dir(&dst).unwrap().next().is_none());
    }
}
