//! Content-selection and overlay filtering of a staged tree.
//!
//! Order of operations: include filtering (legal files survive), exclude
//! filtering, new-root rewriting, empty-directory pruning. Matching is
//! anchored at the content root.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use vendo_config::ContentConfig;
use vendo_fs::path::{relative_to, scoped_join};

use crate::error::{Error, Result};
use crate::glob_match::GlobSet;
use crate::legal::LegalPaths;

/// Compiled filter for one content.
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    legal: LegalPaths,
    new_root: Option<String>,
}

impl PathFilter {
    pub fn from_content(content: &ContentConfig) -> Result<Self> {
        Ok(Self {
            include: GlobSet::new(&content.include_paths, true)?,
            exclude: GlobSet::new(&content.exclude_paths, true)?,
            legal: LegalPaths::from_override(content.legal_paths.as_deref())?,
            new_root: content.new_root_path.clone(),
        })
    }

    /// Apply the filter to the staged tree at `root`, in place.
    pub fn apply(&self, root: &Path) -> Result<()> {
        if !self.include.is_empty() {
            self.delete_files(root, |rel| {
                !self.include.matches_with_ancestors(rel) && !self.legal.matches(rel)
            })?;
        }

        if !self.exclude.is_empty() {
            self.delete_files(root, |rel| self.exclude.matches_with_ancestors(rel))?;
        }

        // Prune before the new-root check so a directory filtering emptied
        // out counts as missing.
        prune_empty_dirs(root)?;

        if let Some(new_root) = &self.new_root {
            promote_new_root(root, new_root)?;
            prune_empty_dirs(root)?;
        }

        Ok(())
    }

    /// Delete every non-directory entry whose relative path satisfies
    /// `condemned`. Directories are left to the pruning pass.
    fn delete_files<F>(&self, root: &Path, condemned: F) -> Result<()>
    where
        F: Fn(&str) -> bool,
    {
        let mut doomed = Vec::new();

        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::io(path, e.into())
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(rel) = relative_to(root, entry.path()) else {
                continue;
            };
            if condemned(&rel) {
                doomed.push(entry.path().to_path_buf());
            }
        }

        for path in doomed {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }

        Ok(())
    }
}

/// Remove paths matching `patterns` from the tree at `root`; used for
/// `ignorePaths`, which drops generated churn before lock computation.
pub fn remove_matching(root: &Path, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Ok(());
    }
    let globs = GlobSet::new(patterns, true)?;

    let mut doomed = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        let Some(rel) = relative_to(root, entry.path()) else {
            continue;
        };
        if globs.matches_with_ancestors(&rel) {
            doomed.push((entry.path().to_path_buf(), entry.file_type().is_dir()));
        }
    }

    // Children sort after parents; delete deepest first.
    doomed.sort_by(|a, b| b.0.cmp(&a.0));
    for (path, is_dir) in doomed {
        if path.symlink_metadata().is_err() {
            // Already removed with an ancestor.
            continue;
        }
        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| Error::io(&path, e))?;
    }

    prune_empty_dirs(root)
}

/// Make `new_root`'s children the root of the tree, discarding siblings.
fn promote_new_root(root: &Path, new_root: &str) -> Result<()> {
    let promoted = scoped_join(root, new_root)?;
    if !promoted.is_dir() {
        return Err(Error::NewRootMissing {
            path: new_root.to_string(),
        });
    }

    // Move the subtree aside, clear the root, then move it back in.
    let holder = root.with_file_name(format!(
        ".{}.new-root",
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "staging".to_string())
    ));
    fs::rename(&promoted, &holder).map_err(|e| Error::io(&promoted, e))?;

    for entry in fs::read_dir(root).map_err(|e| Error::io(root, e))? {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        let path = entry.path();
        let meta = path.symlink_metadata().map_err(|e| Error::io(&path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| Error::io(&path, e))?;
    }

    for entry in fs::read_dir(&holder).map_err(|e| Error::io(&holder, e))? {
        let entry = entry.map_err(|e| Error::io(&holder, e))?;
        let target = root.join(entry.file_name());
        fs::rename(entry.path(), &target).map_err(|e| Error::io(&target, e))?;
    }
    fs::remove_dir(&holder).map_err(|e| Error::io(&holder, e))?;

    Ok(())
}

/// Remove directories that ended up empty, bottom-up.
fn prune_empty_dirs(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(entry.path())
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if is_empty {
            fs::remove_dir(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
        }
    }
    Ok(())
}
