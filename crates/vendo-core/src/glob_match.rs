//! Shell-style glob matching with `**` fixed to mean zero or more path
//! segments.
//!
//! `glob::Pattern` treats `a/**/b` as requiring at least one segment
//! between `a` and `b`; the engine's contract wants zero-or-more. Each
//! pattern is expanded into its segment-collapsed variants (`a/**/b` also
//! tries `a/b`, `**/x` also tries `x`, `d/**` also tries `d`) and a path
//! matches if any variant does. Patterns are anchored at the content root.

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};

/// A compiled set of glob patterns.
pub struct GlobSet {
    patterns: Vec<Pattern>,
    options: MatchOptions,
}

impl GlobSet {
    pub fn new(patterns: &[String], case_sensitive: bool) -> Result<Self> {
        let mut compiled = Vec::new();
        for raw in patterns {
            for variant in expand_double_star(raw) {
                compiled.push(Pattern::new(&variant).map_err(|source| Error::InvalidGlob {
                    pattern: raw.clone(),
                    source,
                })?);
            }
        }
        Ok(Self {
            patterns: compiled,
            options: MatchOptions {
                case_sensitive,
                require_literal_separator: true,
                require_literal_leading_dot: false,
            },
        })
    }

    /// Whether the set is empty (no patterns configured).
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `rel` matches any pattern.
    pub fn matches(&self, rel: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(rel, self.options))
    }

    /// Whether `rel` or any of its ancestor directories matches.
    ///
    /// Lets a plain `docs` pattern select the whole `docs/` subtree.
    pub fn matches_with_ancestors(&self, rel: &str) -> bool {
        if self.matches(rel) {
            return true;
        }
        let mut prefix = String::new();
        for segment in rel.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if prefix.len() < rel.len() && self.matches(&prefix) {
                return true;
            }
        }
        false
    }
}

/// All segment-collapsed variants of a pattern containing `**`.
fn expand_double_star(pattern: &str) -> Vec<String> {
    let mut out = vec![pattern.to_string()];
    let mut i = 0;
    while i < out.len() {
        let current = out[i].clone();
        for variant in collapse_once(&current) {
            if !out.contains(&variant) {
                out.push(variant);
            }
        }
        i += 1;
    }
    out
}

fn collapse_once(pattern: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if let Some(idx) = pattern.find("/**/") {
        variants.push(format!("{}/{}", &pattern[..idx], &pattern[idx + 4..]));
    }
    if let Some(rest) = pattern.strip_prefix("**/") {
        variants.push(rest.to_string());
    }
    if let Some(head) = pattern.strip_suffix("/**") {
        variants.push(head.to_string());
    }
    variants
}
