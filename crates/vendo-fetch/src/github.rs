//! GitHub release asset fetcher.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use vendo_config::lock::{GithubReleaseLock, SourceLock};
use vendo_config::sources::GithubReleaseSource;
use vendo_fs::{checksum, TempArea};

use crate::error::{Error, Result};
use crate::refs::RefFetcher;
use crate::Fetcher;

/// One `<sha256>  <file>` line; tolerates `*` binary markers and `./`.
static CHECKSUM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([0-9a-fA-F]{64})[ \t]+\*?(?:\./)?(.+?)[ \t]*$")
        .expect("invalid checksum line regex")
});

/// Checksum asset names probed when `checksumFile` is unset.
const AUTO_CHECKSUM_NAMES: &[&str] = &[
    "checksums.txt",
    "checksums.sha256",
    "SHA256SUMS",
    "sha256sums.txt",
    "sha256sum.txt",
];

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: String,
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// Downloads release assets and pins their checksums.
pub struct GithubReleaseFetcher<'a> {
    opts: &'a GithubReleaseSource,
    locked: Option<&'a GithubReleaseLock>,
    ref_fetcher: &'a dyn RefFetcher,
}

impl<'a> GithubReleaseFetcher<'a> {
    pub fn new(
        opts: &'a GithubReleaseSource,
        locked: Option<&'a GithubReleaseLock>,
        ref_fetcher: &'a dyn RefFetcher,
    ) -> Self {
        Self {
            opts,
            locked,
            ref_fetcher,
        }
    }

    fn api_url(&self) -> Result<String> {
        if let Some(locked) = self.locked {
            return Ok(locked.url.clone());
        }

        match (&self.opts.tag, self.opts.latest) {
            (Some(tag), false) => Ok(format!(
                "https://api.github.com/repos/{}/releases/tags/{}",
                self.opts.slug, tag
            )),
            (None, true) => Ok(format!(
                "https://api.github.com/repos/{}/releases/latest",
                self.opts.slug
            )),
            _ => Err(Error::validation(
                format!("githubRelease '{}'", self.opts.slug),
                "expected exactly one of tag or latest",
            )),
        }
    }

    fn token(&self) -> Result<Option<String>> {
        let Some(secret_ref) = &self.opts.secret_ref else {
            return Ok(None);
        };
        let secret = self.ref_fetcher.secret(&secret_ref.name)?;
        let data = secret.decoded_data()?;
        match data.get("token") {
            Some(val) => Ok(Some(String::from_utf8_lossy(val).into_owned())),
            None => Err(Error::validation(
                format!("secret '{}'", secret_ref.name),
                "expected a token key",
            )),
        }
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .user_agent(concat!("vendo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| Error::Http {
                url: format!("https://api.github.com/repos/{}", self.opts.slug),
                source,
            })
    }

    fn get(
        &self,
        client: &reqwest::blocking::Client,
        url: &str,
        token: Option<&str>,
    ) -> Result<reqwest::blocking::Response> {
        let mut request = client.get(url);
        if let Some(token) = token {
            request = request.header("Authorization", format!("token {}", token));
        }
        let response = request.send().map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    fn wanted(&self, name: &str) -> bool {
        if self.opts.asset_names.is_empty() {
            return true;
        }
        self.opts
            .asset_names
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .any(|p| p.matches(name))
    }
}

impl Fetcher for GithubReleaseFetcher<'_> {
    fn retrieve(&self, dst: &Path, _temp: &TempArea) -> Result<SourceLock> {
        if self.opts.slug.is_empty() {
            return Err(Error::validation("githubRelease", "expected non-empty slug"));
        }

        let api_url = self.api_url()?;
        let token = self.token()?;
        let client = self.client()?;

        let release: ReleaseInfo = self
            .get(&client, &api_url, token.as_deref())?
            .json()
            .map_err(|source| Error::Http {
                url: api_url.clone(),
                source,
            })?;

        fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

        let mut computed: BTreeMap<String, String> = BTreeMap::new();
        let mut checksum_body: Option<String> = None;

        for asset in &release.assets {
            let is_checksum_file = match &self.opts.checksum_file {
                Some(name) => asset.name == *name,
                None => AUTO_CHECKSUM_NAMES.contains(&asset.name.as_str()),
            };

            if is_checksum_file {
                let body = self
                    .get(&client, &asset.browser_download_url, token.as_deref())?
                    .text()
                    .map_err(|source| Error::Http {
                        url: asset.browser_download_url.clone(),
                        source,
                    })?;
                checksum_body = Some(body);
                continue;
            }

            if !self.wanted(&asset.name) {
                continue;
            }

            let target = dst.join(&asset.name);
            let mut response =
                self.get(&client, &asset.browser_download_url, token.as_deref())?;
            let mut file = fs::File::create(&target).map_err(|e| Error::io(&target, e))?;
            response
                .copy_to(&mut file)
                .map_err(|source| Error::Http {
                    url: asset.browser_download_url.clone(),
                    source,
                })?;

            computed.insert(asset.name.clone(), checksum::sha256_file(&target)?);
        }

        if let Some(body) = &checksum_body {
            let declared = parse_checksums(body);
            for (name, actual) in &computed {
                match declared.get(name) {
                    Some(expected) if expected != actual => {
                        return Err(Error::ChecksumMismatch {
                            subject: name.clone(),
                            expected: expected.clone(),
                            actual: actual.clone(),
                        })
                    }
                    Some(_) => {}
                    None => return Err(Error::ChecksumMissing { asset: name.clone() }),
                }
            }
        } else if !self.opts.disable_auto_checksum_validation {
            return Err(Error::validation(
                format!("githubRelease '{}'", self.opts.slug),
                "no checksums file found in release \
                 (set disableAutoChecksumValidation to skip verification)",
            ));
        }

        if let Some(locked) = self.locked {
            for (name, expected) in &locked.checksums {
                match computed.get(name) {
                    Some(actual) if actual != expected => {
                        return Err(Error::ChecksumMismatch {
                            subject: name.clone(),
                            expected: expected.clone(),
                            actual: actual.clone(),
                        })
                    }
                    Some(_) => {}
                    None => return Err(Error::ChecksumMissing { asset: name.clone() }),
                }
            }
        }

        Ok(SourceLock::GithubRelease(GithubReleaseLock {
            url: api_url,
            tag: release.tag_name,
            checksums: computed,
        }))
    }
}

/// Parse a `sha256sum`-style checksums file into file → digest.
fn parse_checksums(body: &str) -> BTreeMap<String, String> {
    CHECKSUM_LINE
        .captures_iter(body)
        .map(|cap| (cap[2].to_string(), cap[1].to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checksum_lines() {
        let body = "\
0000000000000000000000000000000000000000000000000000000000000001  app-linux-amd64\n\
0000000000000000000000000000000000000000000000000000000000000002 *app-darwin-arm64\n\
0000000000000000000000000000000000000000000000000000000000000003  ./app-windows.exe\n\
garbage line\n";
        let sums = parse_checksums(body);
        assert_eq!(sums.len(), 3);
        assert_eq!(
            sums["app-linux-amd64"],
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert!(sums.contains_key("app-darwin-arm64"));
        assert!(sums.contains_key("app-windows.exe"));
    }

    #[test]
    fn asset_name_globs_filter() {
        let opts = GithubReleaseSource {
            slug: "org/app".to_string(),
            tag: Some("v1".to_string()),
            latest: false,
            checksum_file: None,
            asset_names: vec!["*-linux-*".to_string()],
            disable_auto_checksum_validation: false,
            secret_ref: None,
        };
        struct NoRefs;
        impl RefFetcher for NoRefs {
            fn secret(&self, name: &str) -> Result<vendo_config::Secret> {
                Err(Error::Config(vendo_config::Error::ResourceNotFound {
                    kind: "Secret".to_string(),
                    name: name.to_string(),
                }))
            }
            fn config_map(&self, name: &str) -> Result<vendo_config::ConfigMap> {
                Err(Error::Config(vendo_config::Error::ResourceNotFound {
                    kind: "ConfigMap".to_string(),
                    name: name.to_string(),
                }))
            }
        }
        let fetcher = GithubReleaseFetcher::new(&opts, None, &NoRefs);
        assert!(fetcher.wanted("app-linux-amd64"));
        assert!(!fetcher.wanted("app-darwin-arm64"));
    }

    #[test]
    fn tag_and_latest_are_mutually_exclusive() {
        let mut opts = GithubReleaseSource {
            slug: "org/app".to_string(),
            tag: Some("v1".to_string()),
            latest: true,
            checksum_file: None,
            asset_names: Vec::new(),
            disable_auto_checksum_validation: false,
            secret_ref: None,
        };
        struct NoRefs;
        impl RefFetcher for NoRefs {
            fn secret(&self, _: &str) -> Result<vendo_config::Secret> {
                unreachable!()
            }
            fn config_map(&self, _: &str) -> Result<vendo_config::ConfigMap> {
                unreachable!()
            }
        }
        let fetcher = GithubReleaseFetcher::new(&opts, None, &NoRefs);
        assert!(fetcher.api_url().is_err());

        opts.latest = false;
        let fetcher = GithubReleaseFetcher::new(&opts, None, &NoRefs);
        assert_eq!(
            fetcher.api_url().unwrap(),
            "https://api.github.com/repos/org/app/releases/tags/v1"
        );
    }
}
