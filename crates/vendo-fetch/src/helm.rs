//! Helm chart fetcher driving the helm CLI.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use vendo_config::lock::{HelmChartLock, SourceLock};
use vendo_config::sources::HelmChartSource;
use vendo_fs::{copy, TempArea};

use crate::error::{Error, Result};
use crate::run::{run, EnvPairs};
use crate::Fetcher;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    version: String,
    #[serde(default)]
    app_version: Option<String>,
}

/// Pulls one chart from a repository; the chart directory's contents
/// become the content root.
pub struct HelmChartFetcher<'a> {
    opts: &'a HelmChartSource,
    /// Version pinned by the lock (locked mode).
    locked_version: Option<&'a str>,
}

impl<'a> HelmChartFetcher<'a> {
    pub fn new(opts: &'a HelmChartSource, locked_version: Option<&'a str>) -> Self {
        Self {
            opts,
            locked_version,
        }
    }

    fn version(&self) -> Option<&str> {
        self.locked_version.or(self.opts.version.as_deref())
    }
}

impl Fetcher for HelmChartFetcher<'_> {
    fn retrieve(&self, dst: &Path, temp: &TempArea) -> Result<SourceLock> {
        if self.opts.name.is_empty() {
            return Err(Error::validation("helmChart", "expected non-empty name"));
        }
        if self.opts.repository.url.is_empty() {
            return Err(Error::validation(
                "helmChart",
                "expected non-empty repository URL",
            ));
        }

        let untar_dir = temp.new_temp_dir("helm-chart")?;
        // Keep helm's own cache and config out of the user's home.
        let home_dir = temp.new_temp_dir("helm-home")?;
        let env: EnvPairs = vec![(
            "HOME".to_string(),
            home_dir.to_string_lossy().into_owned(),
        )];

        let untar_str = untar_dir.to_string_lossy().into_owned();
        let mut args = vec![
            "fetch",
            self.opts.name.as_str(),
            "--repo",
            self.opts.repository.url.as_str(),
            "--untar",
            "--untardir",
            untar_str.as_str(),
        ];
        let version = self.version().map(|v| v.to_string());
        if let Some(v) = &version {
            args.push("--version");
            args.push(v);
        }

        run("helm", &args, &env, None)?;

        let chart_dir = single_subdir(&untar_dir)?;
        copy::move_tree(&chart_dir, dst)?;

        let chart_yaml = dst.join("Chart.yaml");
        let meta: ChartMeta = serde_yaml::from_str(
            &fs::read_to_string(&chart_yaml).map_err(|e| Error::io(&chart_yaml, e))?,
        )
        .map_err(|e| Error::validation("helmChart", format!("parsing Chart.yaml: {}", e)))?;

        Ok(SourceLock::HelmChart(HelmChartLock {
            version: meta.version,
            app_version: meta.app_version.unwrap_or_default(),
        }))
    }
}

/// The single directory helm untarred; anything else is unexpected.
fn single_subdir(dir: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    match dirs.as_slice() {
        [one] => Ok(one.clone()),
        _ => Err(Error::validation(
            "helmChart",
            format!("expected exactly one chart directory, found {}", dirs.len()),
        )),
    }
}
