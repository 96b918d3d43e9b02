//! OCI image and imgpkg bundle fetchers.
//!
//! Transport goes through the `crane` and `imgpkg` CLIs; the engine only
//! owns the digest-pinning contract. Registry credentials are materialized
//! as a scoped docker config handed to the subprocess via `DOCKER_CONFIG`.

use std::path::Path;
use std::sync::LazyLock;

use base64::Engine as _;
use regex::Regex;

use vendo_config::lock::{ImageLock, SourceLock};
use vendo_config::sources::{ImageSource, ImgpkgBundleSource, SecretRef};
use vendo_fs::TempArea;

use crate::error::{Error, Result};
use crate::refs::RefFetcher;
use crate::run::{run, EnvPairs};
use crate::{archive, Fetcher};

static BUNDLE_DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'([^']+@sha256:[0-9a-f]{64})'").expect("invalid bundle digest regex")
});

/// Pulls a flattened OCI image filesystem into the destination.
pub struct ImageFetcher<'a> {
    opts: &'a ImageSource,
    /// Digest-pinned reference from the lock (locked mode).
    locked_url: Option<&'a str>,
    ref_fetcher: &'a dyn RefFetcher,
}

impl<'a> ImageFetcher<'a> {
    pub fn new(
        opts: &'a ImageSource,
        locked_url: Option<&'a str>,
        ref_fetcher: &'a dyn RefFetcher,
    ) -> Self {
        Self {
            opts,
            locked_url,
            ref_fetcher,
        }
    }
}

impl Fetcher for ImageFetcher<'_> {
    fn retrieve(&self, dst: &Path, temp: &TempArea) -> Result<SourceLock> {
        if self.opts.url.is_empty() {
            return Err(Error::validation("image", "expected non-empty URL"));
        }

        let env = registry_env(self.opts.secret_ref.as_ref(), &self.opts.url, self.ref_fetcher, temp)?;

        let pinned = match self.locked_url {
            Some(url) => url.to_string(),
            None => resolve_digest(&self.opts.url, &env)?,
        };

        let work = temp.new_temp_dir("image")?;
        let tar_path = work.join("rootfs.tar");
        let tar_str = tar_path.to_string_lossy().into_owned();

        run("crane", &["export", pinned.as_str(), tar_str.as_str()], &env, None)?;
        archive::extract(&tar_path, archive::ArchiveKind::Tar, dst)?;

        Ok(SourceLock::Image(ImageLock { url: pinned }))
    }
}

/// Pulls an imgpkg bundle, resolving `.imgpkg`-referenced images
/// transitively into the bundle layout.
pub struct ImgpkgBundleFetcher<'a> {
    opts: &'a ImgpkgBundleSource,
    locked_url: Option<&'a str>,
    ref_fetcher: &'a dyn RefFetcher,
}

impl<'a> ImgpkgBundleFetcher<'a> {
    pub fn new(
        opts: &'a ImgpkgBundleSource,
        locked_url: Option<&'a str>,
        ref_fetcher: &'a dyn RefFetcher,
    ) -> Self {
        Self {
            opts,
            locked_url,
            ref_fetcher,
        }
    }
}

impl Fetcher for ImgpkgBundleFetcher<'_> {
    fn retrieve(&self, dst: &Path, temp: &TempArea) -> Result<SourceLock> {
        if self.opts.url.is_empty() {
            return Err(Error::validation("imgpkgBundle", "expected non-empty URL"));
        }

        let env = registry_env(self.opts.secret_ref.as_ref(), &self.opts.url, self.ref_fetcher, temp)?;

        let bundle_ref = self.locked_url.unwrap_or(&self.opts.url).to_string();
        let dst_str = dst.to_string_lossy().into_owned();

        let mut args = vec!["pull", "-b", bundle_ref.as_str(), "-o", dst_str.as_str()];
        if self.opts.recursive {
            args.push("--recursive");
        }

        let out = run("imgpkg", &args, &env, None)?;

        let pinned = match self.locked_url {
            Some(url) => url.to_string(),
            // imgpkg reports the resolved reference as
            // `Pulling bundle 'repo@sha256:...'`.
            None => BUNDLE_DIGEST
                .captures(&out.stdout)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .map(Ok)
                .unwrap_or_else(|| resolve_digest(&self.opts.url, &env))?,
        };

        Ok(SourceLock::ImgpkgBundle(ImageLock { url: pinned }))
    }
}

/// Resolve a possibly-tagged reference to its digest-pinned form.
fn resolve_digest(url: &str, env: &EnvPairs) -> Result<String> {
    if url.contains('@') {
        return Ok(url.to_string());
    }

    let out = run("crane", &["digest", url], env, None)?;
    let digest = out.stdout.trim();
    if !digest.starts_with("sha256:") {
        return Err(Error::DigestResolve {
            url: url.to_string(),
            message: format!("unexpected digest output '{}'", digest),
        });
    }

    Ok(format!("{}@{}", strip_tag(url), digest))
}

/// Drop a trailing `:tag` (but not a registry `:port`).
fn strip_tag(url: &str) -> &str {
    match url.rfind(':') {
        Some(idx) if !url[idx + 1..].contains('/') => {
            // A colon before the first slash is a registry port.
            match url.find('/') {
                Some(slash) if idx < slash => url,
                _ => &url[..idx],
            }
        }
        _ => url,
    }
}

/// Build `DOCKER_CONFIG` pointing at a scoped auth file when a secret is
/// referenced.
fn registry_env(
    secret_ref: Option<&SecretRef>,
    url: &str,
    ref_fetcher: &dyn RefFetcher,
    temp: &TempArea,
) -> Result<EnvPairs> {
    let Some(secret_ref) = secret_ref else {
        return Ok(Vec::new());
    };

    let secret = ref_fetcher.secret(&secret_ref.name)?;
    let data = secret.decoded_data()?;

    let username = data.get("username").map(|v| String::from_utf8_lossy(v).into_owned());
    let password = data.get("password").map(|v| String::from_utf8_lossy(v).into_owned());

    let (Some(username), Some(password)) = (username, password) else {
        return Err(Error::validation(
            format!("secret '{}'", secret_ref.name),
            "expected both username and password keys",
        ));
    };

    let registry = url.split('/').next().unwrap_or(url);
    let auth = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", username, password));
    let config = serde_json::json!({
        "auths": { registry: { "auth": auth } }
    });

    let dir = temp.new_temp_dir("docker-config")?;
    let path = dir.join("config.json");
    std::fs::write(&path, config.to_string()).map_err(|e| Error::io(&path, e))?;

    Ok(vec![(
        "DOCKER_CONFIG".to_string(),
        dir.to_string_lossy().into_owned(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tag_removes_tag_only() {
        assert_eq!(strip_tag("registry.io/org/app:v1"), "registry.io/org/app");
        assert_eq!(strip_tag("registry.io/org/app"), "registry.io/org/app");
        assert_eq!(strip_tag("localhost:5000/app"), "localhost:5000/app");
        assert_eq!(strip_tag("localhost:5000/app:v2"), "localhost:5000/app");
    }

    #[test]
    fn bundle_digest_regex_matches_pull_output() {
        let out = "Pulling bundle 'registry.io/org/bundle@sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef'\n  Extracting layer...";
        let cap = BUNDLE_DIGEST.captures(out).unwrap();
        assert!(cap.get(1).unwrap().as_str().starts_with("registry.io/org/bundle@sha256:"));
    }
}
