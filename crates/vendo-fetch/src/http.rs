//! Download-and-extract fetcher for HTTP archives.

use std::fs;
use std::path::Path;

use vendo_config::lock::{HttpArchiveLock, SourceLock};
use vendo_config::sources::HttpArchiveSource;
use vendo_fs::{checksum, TempArea};

use crate::error::{Error, Result};
use crate::refs::RefFetcher;
use crate::{archive, Fetcher};

const BASIC_AUTH_USERNAME_KEY: &str = "username";
const BASIC_AUTH_PASSWORD_KEY: &str = "password";

/// Downloads a URL, verifies or records its SHA-256, and extracts it.
pub struct HttpArchiveFetcher<'a> {
    opts: &'a HttpArchiveSource,
    /// Checksum the download must match (locked mode).
    expected_sha256: Option<&'a str>,
    ref_fetcher: &'a dyn RefFetcher,
}

impl<'a> HttpArchiveFetcher<'a> {
    pub fn new(
        opts: &'a HttpArchiveSource,
        expected_sha256: Option<&'a str>,
        ref_fetcher: &'a dyn RefFetcher,
    ) -> Self {
        Self {
            opts,
            expected_sha256,
            ref_fetcher,
        }
    }

    fn basic_auth(&self) -> Result<Option<(String, String)>> {
        let Some(secret_ref) = &self.opts.secret_ref else {
            return Ok(None);
        };
        let secret = self.ref_fetcher.secret(&secret_ref.name)?;
        let data = secret.decoded_data()?;

        let mut username = None;
        let mut password = None;
        for (key, val) in &data {
            match key.as_str() {
                BASIC_AUTH_USERNAME_KEY => {
                    username = Some(String::from_utf8_lossy(val).into_owned())
                }
                BASIC_AUTH_PASSWORD_KEY => {
                    password = Some(String::from_utf8_lossy(val).into_owned())
                }
                other => {
                    return Err(Error::UnknownSecretKey {
                        name: secret_ref.name.clone(),
                        key: other.to_string(),
                    })
                }
            }
        }

        match (username, password) {
            (Some(u), Some(p)) => Ok(Some((u, p))),
            _ => Err(Error::validation(
                format!("secret '{}'", secret_ref.name),
                "expected both username and password keys",
            )),
        }
    }

    fn download(&self, dst_file: &Path) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("vendo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| Error::Http {
                url: self.opts.url.clone(),
                source,
            })?;

        let mut request = client.get(&self.opts.url);
        if let Some((username, password)) = self.basic_auth()? {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().map_err(|source| Error::Http {
            url: self.opts.url.clone(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url: self.opts.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let mut response = response;
        let mut file = fs::File::create(dst_file).map_err(|e| Error::io(dst_file, e))?;
        response
            .copy_to(&mut file)
            .map_err(|source| Error::Http {
                url: self.opts.url.clone(),
                source,
            })?;

        Ok(checksum::sha256_file(dst_file)?)
    }
}

impl Fetcher for HttpArchiveFetcher<'_> {
    fn retrieve(&self, dst: &Path, temp: &TempArea) -> Result<SourceLock> {
        if self.opts.url.is_empty() {
            return Err(Error::validation("httpArchive", "expected non-empty URL"));
        }

        let work = temp.new_temp_dir("http-archive")?;
        let archive_file = work.join("archive");

        let sha256 = self.download(&archive_file)?;

        if let Some(expected) = self.expected_sha256 {
            if !self.opts.disable_verification && sha256 != expected {
                return Err(Error::ChecksumMismatch {
                    subject: self.opts.url.clone(),
                    expected: expected.to_string(),
                    actual: sha256,
                });
            }
        }

        let kind = archive::sniff(&archive_file)?;
        archive::extract(&archive_file, kind, dst)?;

        Ok(SourceLock::HttpArchive(HttpArchiveLock { sha256 }))
    }
}
