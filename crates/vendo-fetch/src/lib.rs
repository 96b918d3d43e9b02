//! Content fetchers for the vendo sync engine.
//!
//! Every source kind implements the one [`Fetcher`] contract: retrieve
//! into a destination directory and return the lock record pinning what
//! was fetched. On error the destination's contents are undefined and the
//! caller discards them. Fetchers are idempotent under identical inputs
//! and identical lock material.

mod error;

pub mod archive;
pub mod directory;
pub mod git;
pub mod github;
pub mod helm;
pub mod http;
pub mod image;
pub mod inline;
pub mod refs;
pub mod run;

use std::path::{Path, PathBuf};

use vendo_config::{LockContent, Source, SourceLock};
use vendo_fs::TempArea;

pub use error::{Error, Result};
pub use refs::{RefFetcher, ResourceRefFetcher};

/// The uniform retrieval contract.
pub trait Fetcher {
    /// Fetch into `dst` and pin the result.
    ///
    /// On success `dst` holds the fetched tree (possibly empty). On error
    /// `dst` is undefined and must be discarded.
    fn retrieve(&self, dst: &Path, temp: &TempArea) -> Result<SourceLock>;
}

impl std::fmt::Debug for dyn Fetcher + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Fetcher")
    }
}

/// Everything a fetcher may need besides its own source options.
pub struct FetchContext<'a> {
    /// Root the config's relative paths resolve against.
    pub config_root: &'a Path,
    /// Live location of this content's sub-path, for `manual` sources.
    pub existing_content_dir: Option<PathBuf>,
    pub ref_fetcher: &'a dyn RefFetcher,
}

/// Build the fetcher for a source, substituting pinned identifiers from
/// the lock when one is supplied (locked mode).
///
/// A lock record of a different source kind is a fatal mismatch.
pub fn for_source<'a>(
    source: Source<'a>,
    locked: Option<&'a LockContent>,
    ctx: &'a FetchContext<'a>,
) -> Result<Box<dyn Fetcher + 'a>> {
    if let Some(locked) = locked {
        let locked_kind = locked.source_kind().unwrap_or("none");
        if locked_kind != source.kind() {
            return Err(Error::validation(
                format!("content '{}'", locked.path),
                format!(
                    "configured source kind '{}' does not match locked kind '{}'",
                    source.kind(),
                    locked_kind
                ),
            ));
        }
    }

    let fetcher: Box<dyn Fetcher + 'a> = match source {
        Source::Git(opts) => {
            let sha = locked
                .and_then(|l| l.git.as_ref())
                .map(|g| g.sha.as_str());
            Box::new(git::GitFetcher::new(opts, sha, ctx.ref_fetcher))
        }
        Source::HttpArchive(opts) => {
            let sha256 = locked
                .and_then(|l| l.http_archive.as_ref())
                .map(|h| h.sha256.as_str());
            Box::new(http::HttpArchiveFetcher::new(opts, sha256, ctx.ref_fetcher))
        }
        Source::Image(opts) => {
            let url = locked
                .and_then(|l| l.image.as_ref())
                .map(|i| i.url.as_str());
            Box::new(image::ImageFetcher::new(opts, url, ctx.ref_fetcher))
        }
        Source::ImgpkgBundle(opts) => {
            let url = locked
                .and_then(|l| l.imgpkg_bundle.as_ref())
                .map(|i| i.url.as_str());
            Box::new(image::ImgpkgBundleFetcher::new(opts, url, ctx.ref_fetcher))
        }
        Source::GithubRelease(opts) => {
            let pinned = locked.and_then(|l| l.github_release.as_ref());
            Box::new(github::GithubReleaseFetcher::new(
                opts,
                pinned,
                ctx.ref_fetcher,
            ))
        }
        Source::HelmChart(opts) => {
            let version = locked
                .and_then(|l| l.helm_chart.as_ref())
                .map(|h| h.version.as_str());
            Box::new(helm::HelmChartFetcher::new(opts, version))
        }
        Source::Manual(_) => Box::new(directory::ManualFetcher::new(
            ctx.existing_content_dir.clone(),
        )),
        Source::Inline(opts) => Box::new(inline::InlineFetcher::new(opts, ctx.ref_fetcher)),
        Source::Directory(opts) => {
            Box::new(directory::DirectoryFetcher::new(opts, ctx.config_root))
        }
    };

    Ok(fetcher)
}
