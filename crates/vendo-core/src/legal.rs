//! Legal-file detection.
//!
//! Filtering must not silently drop license material. Files matching these
//! patterns survive include filtering at their original locations unless
//! the content overrides the set (an empty override disables preservation).

use crate::glob_match::GlobSet;
use crate::Result;

/// Default legal filename globs: case-insensitive, any depth, any suffix.
pub const DEFAULT_LEGAL_PATTERNS: &[&str] = &[
    "**/LICENSE*",
    "**/LICENCE*",
    "**/NOTICE*",
    "**/COPYING*",
    "**/COPYRIGHT*",
    "**/AUTHORS*",
    "**/PATENTS*",
];

/// The effective legal glob set for one content.
pub struct LegalPaths {
    globs: GlobSet,
}

impl LegalPaths {
    /// Build from an optional override; `None` selects the defaults, an
    /// override replaces (not extends) them.
    pub fn from_override(overrides: Option<&[String]>) -> Result<Self> {
        let patterns: Vec<String> = match overrides {
            Some(list) => list.to_vec(),
            None => DEFAULT_LEGAL_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        };
        Ok(Self {
            globs: GlobSet::new(&patterns, false)?,
        })
    }

    /// Whether a content-root-relative path is legal material.
    pub fn matches(&self, rel: &str) -> bool {
        self.globs.matches(rel)
    }
}
