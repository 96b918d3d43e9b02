//! The declarative config document.
//!
//! On the wire a content names its source by setting exactly one of the
//! per-kind nullable fields; [`ContentConfig::source`] converts that shape
//! into a tagged [`Source`] so the engine can dispatch on it, and
//! validation rejects anything with zero or multiple kinds set.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sources::{
    DirectorySource, GitSource, GithubReleaseSource, HelmChartSource, HttpArchiveSource,
    ImageSource, ImgpkgBundleSource, InlineSource, ManualSource,
};
use crate::version;

/// API group/version accepted in config and lock documents.
pub const API_VERSION: &str = "vendo.dev/v1alpha1";
/// `kind` of the config document.
pub const CONFIG_KIND: &str = "Config";

/// Top-level declarative input.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub api_version: String,
    pub kind: String,
    /// Engine version floor; syncing with an older engine fails fast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_required_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<DirectoryConfig>,
}

/// One declared target directory.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Target directory, relative to the config root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<ContentConfig>,
    /// Mode bits applied to the final directory (e.g. `0o755`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u32>,
}

/// One content source contributing to a directory at a sub-path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentConfig {
    /// Sub-path under the directory this content's tree is rooted at.
    /// `.` roots the content at the directory itself.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "http")]
    pub http_archive: Option<HttpArchiveSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgpkg_bundle: Option<ImgpkgBundleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_release: Option<GithubReleaseSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_chart: Option<HelmChartSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<ManualSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectorySource>,

    /// Keep only matching paths. Everything when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<String>,
    /// Drop matching paths after include filtering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_paths: Vec<String>,
    /// Drop matching paths from staging before lock computation; tames
    /// churn from generated files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_paths: Vec<String>,
    /// Post-filter, make this sub-path the content root and discard the
    /// rest. Must exist after filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_root_path: Option<String>,
    /// Overrides the default legal-file glob set. An empty list disables
    /// legal-file preservation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_paths: Option<Vec<String>>,
}

/// A content's source, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source<'a> {
    Git(&'a GitSource),
    HttpArchive(&'a HttpArchiveSource),
    Image(&'a ImageSource),
    ImgpkgBundle(&'a ImgpkgBundleSource),
    GithubRelease(&'a GithubReleaseSource),
    HelmChart(&'a HelmChartSource),
    Manual(&'a ManualSource),
    Inline(&'a InlineSource),
    Directory(&'a DirectorySource),
}

impl Source<'_> {
    /// Wire name of the source kind, as it appears in config and lock.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Git(_) => "git",
            Source::HttpArchive(_) => "httpArchive",
            Source::Image(_) => "image",
            Source::ImgpkgBundle(_) => "imgpkgBundle",
            Source::GithubRelease(_) => "githubRelease",
            Source::HelmChart(_) => "helmChart",
            Source::Manual(_) => "manual",
            Source::Inline(_) => "inline",
            Source::Directory(_) => "directory",
        }
    }
}

impl ContentConfig {
    /// The single configured source.
    ///
    /// Errors if zero or more than one source kind is set.
    pub fn source(&self) -> Result<Source<'_>> {
        let mut found: Vec<Source<'_>> = Vec::new();

        if let Some(s) = &self.git {
            found.push(Source::Git(s));
        }
        if let Some(s) = &self.http_archive {
            found.push(Source::HttpArchive(s));
        }
        if let Some(s) = &self.image {
            found.push(Source::Image(s));
        }
        if let Some(s) = &self.imgpkg_bundle {
            found.push(Source::ImgpkgBundle(s));
        }
        if let Some(s) = &self.github_release {
            found.push(Source::GithubRelease(s));
        }
        if let Some(s) = &self.helm_chart {
            found.push(Source::HelmChart(s));
        }
        if let Some(s) = &self.manual {
            found.push(Source::Manual(s));
        }
        if let Some(s) = &self.inline {
            found.push(Source::Inline(s));
        }
        if let Some(s) = &self.directory {
            found.push(Source::Directory(s));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(Error::validation(
                format!("content '{}'", self.path),
                "expected exactly one source kind, found none",
            )),
            _ => {
                let kinds: Vec<&str> = found.iter().map(|s| s.kind()).collect();
                Err(Error::validation(
                    format!("content '{}'", self.path),
                    format!("expected exactly one source kind, found {}", kinds.join(", ")),
                ))
            }
        }
    }
}

impl Config {
    /// Validate structure: document identity, version floor, path
    /// containment, uniqueness and sub-path disjointness.
    pub fn validate(&self, engine_version: &str) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(Error::validation(
                "config",
                format!(
                    "unsupported apiVersion '{}' (expected '{}')",
                    self.api_version, API_VERSION
                ),
            ));
        }
        if self.kind != CONFIG_KIND {
            return Err(Error::validation(
                "config",
                format!("unsupported kind '{}' (expected '{}')", self.kind, CONFIG_KIND),
            ));
        }

        if let Some(floor) = &self.minimum_required_version {
            version::check_minimum_required(engine_version, floor)?;
        }

        for (i, dir) in self.directories.iter().enumerate() {
            validate_relative_path(&format!("directories[{}].path", i), &dir.path)?;

            if self
                .directories
                .iter()
                .skip(i + 1)
                .any(|other| other.path == dir.path)
            {
                return Err(Error::validation(
                    format!("directory '{}'", dir.path),
                    "duplicate directory path",
                ));
            }

            dir.validate()?;
        }

        Ok(())
    }

    /// Look up a directory by its configured path.
    pub fn find_directory(&self, path: &str) -> Option<&DirectoryConfig> {
        self.directories.iter().find(|d| d.path == path)
    }
}

impl DirectoryConfig {
    fn validate(&self) -> Result<()> {
        for (i, content) in self.contents.iter().enumerate() {
            let subject = format!("directory '{}' content '{}'", self.path, content.path);

            if content.path != "." {
                validate_relative_path(&subject, &content.path)?;
            }
            content.source().map_err(|e| match e {
                Error::Validation { message, .. } => Error::Validation {
                    subject: subject.clone(),
                    message,
                },
                other => other,
            })?;

            for other in self.contents.iter().skip(i + 1) {
                if segment_prefix(&content.path, &other.path)
                    || segment_prefix(&other.path, &content.path)
                {
                    return Err(Error::validation(
                        format!("directory '{}'", self.path),
                        format!(
                            "content paths '{}' and '{}' overlap",
                            content.path, other.path
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn validate_relative_path(subject: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::validation(subject, "expected non-empty path"));
    }
    if path.starts_with('/') {
        return Err(Error::validation(subject, "expected relative path"));
    }
    if path.split('/').any(|seg| seg == ".." || seg.is_empty()) {
        return Err(Error::validation(
            subject,
            "path must not contain '..' or empty segments",
        ));
    }
    Ok(())
}

fn segment_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_matches('/');
    if prefix == "." || prefix.is_empty() {
        return true;
    }
    path == prefix || path.starts_with(&format!("{}/", prefix))
}
