//! The lock document: every non-deterministic input pinned.
//!
//! Structure mirrors the config so entries correspond 1:1, in order, with
//! configured contents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::API_VERSION;
use crate::error::{Error, Result};

/// `kind` of the lock document.
pub const LOCK_KIND: &str = "LockConfig";

/// Top-level reproducibility record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LockConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_lock_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<LockDirectory>,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_lock_kind() -> String {
    LOCK_KIND.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LockDirectory {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<LockContent>,
}

/// Lock record for one content; exactly one kind-specific field is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LockContent {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitLock>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "http")]
    pub http_archive: Option<HttpArchiveLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgpkg_bundle: Option<ImageLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_release: Option<GithubReleaseLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_chart: Option<HelmChartLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<EmptyLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<EmptyLock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<EmptyLock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitLock {
    pub sha: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpArchiveLock {
    /// Hex SHA-256 of the downloaded artifact.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageLock {
    /// Digest-pinned reference: `repo@sha256:...`.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubReleaseLock {
    pub url: String,
    pub tag: String,
    /// Asset file name to hex SHA-256.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmChartLock {
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_version: String,
}

/// Record for sources deterministic by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyLock {}

/// What a fetcher pinned, tagged by source kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLock {
    Git(GitLock),
    HttpArchive(HttpArchiveLock),
    Image(ImageLock),
    ImgpkgBundle(ImageLock),
    GithubRelease(GithubReleaseLock),
    HelmChart(HelmChartLock),
    Manual,
    Inline,
    Directory,
}

impl LockContent {
    /// Build the wire record for one content from a fetcher's result.
    pub fn new(path: impl Into<String>, lock: SourceLock) -> Self {
        let mut content = LockContent {
            path: path.into(),
            ..Default::default()
        };
        match lock {
            SourceLock::Git(l) => content.git = Some(l),
            SourceLock::HttpArchive(l) => content.http_archive = Some(l),
            SourceLock::Image(l) => content.image = Some(l),
            SourceLock::ImgpkgBundle(l) => content.imgpkg_bundle = Some(l),
            SourceLock::GithubRelease(l) => content.github_release = Some(l),
            SourceLock::HelmChart(l) => content.helm_chart = Some(l),
            SourceLock::Manual => content.manual = Some(EmptyLock {}),
            SourceLock::Inline => content.inline = Some(EmptyLock {}),
            SourceLock::Directory => content.directory = Some(EmptyLock {}),
        }
        content
    }

    /// Wire name of the pinned source kind, when exactly one is set.
    pub fn source_kind(&self) -> Option<&'static str> {
        let mut kinds = Vec::new();
        if self.git.is_some() {
            kinds.push("git");
        }
        if self.http_archive.is_some() {
            kinds.push("httpArchive");
        }
        if self.image.is_some() {
            kinds.push("image");
        }
        if self.imgpkg_bundle.is_some() {
            kinds.push("imgpkgBundle");
        }
        if self.github_release.is_some() {
            kinds.push("githubRelease");
        }
        if self.helm_chart.is_some() {
            kinds.push("helmChart");
        }
        if self.manual.is_some() {
            kinds.push("manual");
        }
        if self.inline.is_some() {
            kinds.push("inline");
        }
        if self.directory.is_some() {
            kinds.push("directory");
        }
        match kinds.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }
}

impl LockConfig {
    /// A fresh, empty lock document.
    pub fn new() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_lock_kind(),
            directories: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(Error::validation(
                "lock",
                format!(
                    "unsupported apiVersion '{}' (expected '{}')",
                    self.api_version, API_VERSION
                ),
            ));
        }
        if self.kind != LOCK_KIND {
            return Err(Error::validation(
                "lock",
                format!("unsupported kind '{}' (expected '{}')", self.kind, LOCK_KIND),
            ));
        }
        Ok(())
    }

    pub fn find_directory(&self, path: &str) -> Option<&LockDirectory> {
        self.directories.iter().find(|d| d.path == path)
    }

    /// Replace or append the record for one directory, keeping declared
    /// config order for existing entries.
    pub fn upsert_directory(&mut self, dir: LockDirectory) {
        match self.directories.iter_mut().find(|d| d.path == dir.path) {
            Some(existing) => *existing = dir,
            None => self.directories.push(dir),
        }
    }
}

impl LockDirectory {
    pub fn find_content(&self, path: &str) -> Option<&LockContent> {
        self.contents.iter().find(|c| c.path == path)
    }
}
