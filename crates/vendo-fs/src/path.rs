//! Scoped path joins.
//!
//! Config-supplied paths are relative and must resolve strictly under the
//! root they are joined to. Rejection happens lexically, before any I/O.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Join a relative, config-supplied path onto `root`.
///
/// Rejects absolute paths and any `..` component so a crafted path cannot
/// escape the root. `.` components are dropped.
pub fn scoped_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let mut out = root.to_path_buf();

    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => {
                return Err(Error::PathEscapesRoot {
                    root: root.to_path_buf(),
                    path: rel.to_string(),
                })
            }
        }
    }

    Ok(out)
}

/// Whether `prefix` is a path-segment prefix of `path` (or equal to it).
///
/// Operates on `/`-separated relative strings, the form content sub-paths
/// take in config. `"a"` is a prefix of `"a/b"` but not of `"ab"`.
pub fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_matches('/');
    if prefix.is_empty() || prefix == "." {
        return true;
    }
    path == prefix || path.starts_with(&format!("{}/", prefix))
}

/// Relative path of `child` under `base`, `/`-separated.
///
/// Returns `None` if `child` is not under `base`.
pub fn relative_to(base: &Path, child: &Path) -> Option<String> {
    let rel = child.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
