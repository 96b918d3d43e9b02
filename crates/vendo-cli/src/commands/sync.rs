//! The `sync` command: load config and lock, run the engine, write the
//! new lock.

use std::path::{Path, PathBuf};

use colored::Colorize;

use vendo_config::{ConfigSet, LockConfig};
use vendo_core::{write_lock_file, SyncOptions};

use crate::error::{CliError, Result};

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct SyncArgs {
    pub file: PathBuf,
    pub lock_file: PathBuf,
    pub locked: bool,
    pub directories: Vec<String>,
    pub chdir: Option<PathBuf>,
}

pub fn run_sync(args: &SyncArgs) -> Result<()> {
    if let Some(dir) = &args.chdir {
        std::env::set_current_dir(dir).map_err(|e| {
            CliError::user(format!("changing directory to '{}': {}", dir.display(), e))
        })?;
    }

    let root = std::env::current_dir()?;
    let set = ConfigSet::load(&args.file, ENGINE_VERSION)?;
    let previous_lock = load_lock(&args.lock_file, args.locked)?;

    let opts = SyncOptions {
        locked: args.locked,
        directories: if args.directories.is_empty() {
            None
        } else {
            Some(args.directories.clone())
        },
    };

    let lock = vendo_core::sync(&root, &set, previous_lock.as_ref(), &opts)?;
    write_lock_file(&args.lock_file, &lock)?;

    let synced = match &opts.directories {
        Some(selected) => selected.len(),
        None => set.config.directories.len(),
    };
    println!(
        "{} synced {} director{}, lock written to {}",
        "vendo".green().bold(),
        synced,
        if synced == 1 { "y" } else { "ies" },
        args.lock_file.display()
    );

    Ok(())
}

fn load_lock(path: &Path, required: bool) -> Result<Option<LockConfig>> {
    if path.exists() {
        Ok(Some(LockConfig::load(path)?))
    } else if required {
        Err(CliError::user(format!(
            "--locked requires a lock file at '{}'",
            path.display()
        )))
    } else {
        Ok(None)
    }
}
