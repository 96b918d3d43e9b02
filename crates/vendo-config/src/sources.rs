//! Per-kind source configuration.
//!
//! Each struct mirrors one nullable field of [`ContentConfig`]
//! (crate::config::ContentConfig) on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reference to a `Secret` resource declared alongside the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretRef {
    pub name: String,
}

/// Reference to a `ConfigMap` resource declared alongside the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigMapRef {
    pub name: String,
}

/// Clone-and-checkout source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitSource {
    pub url: String,
    /// Branch, tag, or commit. Substituted with the locked SHA in locked mode.
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lfs_skip_smudge: bool,
    /// Shallow fetch depth. Full history when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

/// Download-and-extract source (tar, tar+gzip, or zip by content sniff).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpArchiveSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
    /// Skip comparing the download against the locked checksum.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_verification: bool,
}

/// OCI image source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageSource {
    /// Image reference, by tag or digest.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

/// imgpkg bundle source (image plus transitively-resolved references).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImgpkgBundleSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
    /// Also pull bundles referenced by this bundle.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
}

/// GitHub release asset source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubReleaseSource {
    /// `owner/repo`.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub latest: bool,
    /// Name of the checksums asset. Auto-detected among common names when
    /// unset, unless validation is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_file: Option<String>,
    /// Globs selecting which assets to download. All assets when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_names: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_auto_checksum_validation: bool,
    /// Secret holding a `token` key for the GitHub API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

/// Helm chart source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmChartSource {
    /// Chart name inside the repository.
    pub name: String,
    /// Chart version. Latest when unset; pinned in locked mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub repository: HelmChartRepo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmChartRepo {
    pub url: String,
}

/// User-managed content: the engine preserves whatever is already there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManualSource {}

/// Content embedded directly in the config or referenced resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InlineSource {
    /// Literal file contents by relative path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, String>,
    /// Resources whose data keys become files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_from: Vec<InlineSourceRef>,
}

/// One resource reference inside an inline source. Exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InlineSourceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<InlineRefTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<InlineRefTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InlineRefTarget {
    pub name: String,
    /// Subdirectory the resource's files land in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_path: Option<String>,
}

/// Copy of a config-root-relative directory, typically a previously-synced
/// subtree kept to carry manual edits forward.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectorySource {
    pub path: String,
}
