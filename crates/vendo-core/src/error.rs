//! Error types for vendo-core

use std::path::PathBuf;

/// Result type for vendo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while filtering and syncing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Expected newRootPath '{path}' to exist after filtering")]
    NewRootMissing { path: String },

    #[error("Unknown directory '{path}' (not present in config)")]
    UnknownDirectory { path: String },

    #[error("Locked sync requires a lock file")]
    MissingLockFile,

    #[error("Locked sync: no lock entry for directory '{directory}'")]
    MissingLockDirectory { directory: String },

    #[error("Locked sync: no lock entry for directory '{directory}' content '{content}'")]
    MissingLockContent { directory: String, content: String },

    #[error("Content path '{path}' already staged (sub-paths must be disjoint)")]
    StagingConflict { path: String },

    #[error("Syncing directory '{directory}': {source}")]
    DirectorySync {
        directory: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Syncing directory '{directory}' content '{content}': {source}")]
    ContentSync {
        directory: String,
        content: String,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] vendo_fetch::Error),

    #[error(transparent)]
    Config(#[from] vendo_config::Error),

    #[error(transparent)]
    Fs(#[from] vendo_fs::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the directory a failure surfaced in.
    pub fn in_directory(self, directory: &str) -> Self {
        match self {
            already @ (Error::DirectorySync { .. } | Error::ContentSync { .. }) => already,
            other => Error::DirectorySync {
                directory: directory.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Attach the directory and content path a failure surfaced in.
    pub fn in_content(self, directory: &str, content: &str) -> Self {
        Error::ContentSync {
            directory: directory.to_string(),
            content: content.to_string(),
            source: Box::new(self),
        }
    }
}
