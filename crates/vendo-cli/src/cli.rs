//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// vendo - declarative vendoring of external sources
#[derive(Parser, Debug)]
#[command(name = "vendo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch, filter and materialize configured directories
    ///
    /// Reads the config, syncs every directory (or a selected subset),
    /// and writes the lock file pinning every non-deterministic input.
    ///
    /// Examples:
    ///   vendo sync
    ///   vendo sync --locked
    ///   vendo sync -d vendor/lib
    Sync {
        /// Config file path
        #[arg(short = 'f', long, default_value = "vendo.yml")]
        file: PathBuf,

        /// Lock file path
        #[arg(long, default_value = "vendo.lock.yml")]
        lock_file: PathBuf,

        /// Consume the lock verbatim; refuse to resolve unpinned refs
        #[arg(long)]
        locked: bool,

        /// Restrict the sync to these directories (repeatable)
        #[arg(short = 'd', long = "directory")]
        directories: Vec<String>,

        /// Change to this directory before doing anything
        #[arg(long)]
        chdir: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   vendo completions bash > ~/.local/share/bash-completion/completions/vendo
    ///   vendo completions zsh > ~/.zfunc/_vendo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_sync_defaults() {
        let cli = Cli::parse_from(["vendo", "sync"]);
        match cli.command {
            Commands::Sync {
                file,
                lock_file,
                locked,
                directories,
                chdir,
            } => {
                assert_eq!(file, PathBuf::from("vendo.yml"));
                assert_eq!(lock_file, PathBuf::from("vendo.lock.yml"));
                assert!(!locked);
                assert!(directories.is_empty());
                assert!(chdir.is_none());
            }
            other => panic!("expected Sync, got {other:?}"),
        }
    }

    #[test]
    fn parse_sync_locked_with_directories() {
        let cli = Cli::parse_from([
            "vendo", "sync", "--locked", "-d", "vendor/a", "-d", "vendor/b",
        ]);
        match cli.command {
            Commands::Sync {
                locked,
                directories,
                ..
            } => {
                assert!(locked);
                assert_eq!(directories, vec!["vendor/a", "vendor/b"]);
            }
            other => panic!("expected Sync, got {other:?}"),
        }
    }

    #[test]
    fn parse_sync_custom_files() {
        let cli = Cli::parse_from([
            "vendo",
            "sync",
            "-f",
            "other.yml",
            "--lock-file",
            "other.lock.yml",
            "--chdir",
            "sub",
        ]);
        match cli.command {
            Commands::Sync {
                file,
                lock_file,
                chdir,
                ..
            } => {
                assert_eq!(file, PathBuf::from("other.yml"));
                assert_eq!(lock_file, PathBuf::from("other.lock.yml"));
                assert_eq!(chdir, Some(PathBuf::from("sub")));
            }
            other => panic!("expected Sync, got {other:?}"),
        }
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["vendo", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions { .. }));
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::parse_from(["vendo", "sync", "--verbose"]);
        assert!(cli.verbose);
    }
}
