//! Inline content fetcher: file material embedded in the config or pulled
//! from declared resources.

use std::fs;
use std::path::Path;

use vendo_config::lock::SourceLock;
use vendo_config::sources::{InlineRefTarget, InlineSource};
use vendo_fs::{path::scoped_join, TempArea};

use crate::error::{Error, Result};
use crate::refs::RefFetcher;
use crate::Fetcher;

/// Materializes literal paths and referenced resource data as files.
pub struct InlineFetcher<'a> {
    opts: &'a InlineSource,
    ref_fetcher: &'a dyn RefFetcher,
}

impl<'a> InlineFetcher<'a> {
    pub fn new(opts: &'a InlineSource, ref_fetcher: &'a dyn RefFetcher) -> Self {
        Self { opts, ref_fetcher }
    }

    fn write_file(&self, dst: &Path, rel: &str, content: &[u8]) -> Result<()> {
        let target = scoped_join(dst, rel)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&target, content).map_err(|e| Error::io(&target, e))
    }

    fn write_ref(&self, dst: &Path, target: &InlineRefTarget, secret: bool) -> Result<()> {
        let data: Vec<(String, Vec<u8>)> = if secret {
            self.ref_fetcher
                .secret(&target.name)?
                .decoded_data()?
                .into_iter()
                .collect()
        } else {
            self.ref_fetcher
                .config_map(&target.name)?
                .data
                .iter()
                .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()))
                .collect()
        };

        for (key, bytes) in data {
            let rel = match &target.directory_path {
                Some(dir) => format!("{}/{}", dir.trim_end_matches('/'), key),
                None => key,
            };
            self.write_file(dst, &rel, &bytes)?;
        }

        Ok(())
    }
}

impl Fetcher for InlineFetcher<'_> {
    fn retrieve(&self, dst: &Path, _temp: &TempArea) -> Result<SourceLock> {
        fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

        for (rel, content) in &self.opts.paths {
            self.write_file(dst, rel, content.as_bytes())?;
        }

        for source_ref in &self.opts.paths_from {
            match (&source_ref.secret_ref, &source_ref.config_map_ref) {
                (Some(target), None) => self.write_ref(dst, target, true)?,
                (None, Some(target)) => self.write_ref(dst, target, false)?,
                _ => {
                    return Err(Error::validation(
                        "inline",
                        "expected exactly one of secretRef or configMapRef",
                    ))
                }
            }
        }

        Ok(SourceLock::Inline)
    }
}
