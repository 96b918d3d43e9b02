//! Scoped temp workspace for one engine invocation.

use std::cell::Cell;
use std::path::PathBuf;

use crate::{Error, Result};

/// A per-invocation scratch area handing out fresh subdirectories.
///
/// All returned paths live under one root that is removed when the area is
/// dropped, so cleanup covers every exit path including panics. Fetchers
/// receive a `&TempArea` and must never write outside paths it hands out.
pub struct TempArea {
    root: tempfile::TempDir,
    seq: Cell<u64>,
}

impl TempArea {
    /// Create a new temp area under the system temp directory.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("vendo-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        Ok(Self {
            root,
            seq: Cell::new(0),
        })
    }

    /// Create a fresh, empty subdirectory labeled for debuggability.
    ///
    /// Labels are sanitized so content sub-paths like `vendor/lib` produce
    /// a flat directory name.
    pub fn new_temp_dir(&self, label: &str) -> Result<PathBuf> {
        let n = self.seq.get();
        self.seq.set(n + 1);

        let sanitized: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            })
            .collect();

        let dir = self.root.path().join(format!("{:04}-{}", n, sanitized));
        std::fs::create_dir(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(dir)
    }
}
