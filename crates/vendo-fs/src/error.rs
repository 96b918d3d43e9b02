//! Error types for vendo-fs

use std::path::PathBuf;

/// Result type for vendo-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vendo-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path '{path}' escapes root '{root}'")]
    PathEscapesRoot { root: PathBuf, path: String },

    #[error("Expected '{path}' to be a directory")]
    NotADirectory { path: PathBuf },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Replacing '{live}': {message}")]
    Replace { live: PathBuf, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
