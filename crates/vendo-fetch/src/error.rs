//! Error types for vendo-fetch

use std::path::PathBuf;

/// Result type for vendo-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching content
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validating {subject}: {message}")]
    Validation { subject: String, message: String },

    #[error("Resolving secret '{name}': unknown key '{key}'")]
    UnknownSecretKey { name: String, key: String },

    #[error("Spawning {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Running {program} {args}: exit code {code} (stderr: {stderr})")]
    CommandFailed {
        program: String,
        args: String,
        code: i32,
        stderr: String,
    },

    #[error("Fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching {url}: unexpected status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Verifying {subject}: expected sha256 {expected}, got {actual}")]
    ChecksumMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("No checksum for asset '{asset}' in checksums file")]
    ChecksumMissing { asset: String },

    #[error("Unrecognized archive format (expected tar, tar+gzip or zip)")]
    UnknownArchiveFormat,

    #[error("Archive entry '{entry}' escapes the extraction root")]
    ArchiveEntryEscapes { entry: String },

    #[error("Extracting archive: {message}")]
    Archive { message: String },

    #[error("Resolving digest for '{url}': {message}")]
    DigestResolve { url: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] vendo_fs::Error),

    #[error(transparent)]
    Config(#[from] vendo_config::Error),
}

impl Error {
    pub fn validation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
