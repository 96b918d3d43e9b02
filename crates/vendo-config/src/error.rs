//! Error types for vendo-config

/// Result type for vendo-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur loading or validating config and lock documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reading {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Serializing {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown document kind '{kind}' (expected Config, Secret or ConfigMap)")]
    UnknownKind { kind: String },

    #[error("Validating {subject}: {message}")]
    Validation { subject: String, message: String },

    #[error("Config requires engine version >= {required}, this is {current}")]
    EngineTooOld { required: String, current: String },

    #[error("Invalid version '{version}': {source}")]
    Version {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Secret '{name}' key '{key}': invalid base64: {source}")]
    SecretData {
        name: String,
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Resource {kind} '{name}' not defined in config")]
    ResourceNotFound { kind: String, name: String },
}

impl Error {
    pub fn validation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            message: message.into(),
        }
    }
}
