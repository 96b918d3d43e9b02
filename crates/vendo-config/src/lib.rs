//! Config and lock data model for the vendo sync engine.
//!
//! The config file is a YAML document stream holding one `Config` document
//! and any number of `Secret`/`ConfigMap` resources. The lock file is a
//! single `LockConfig` document mirroring the config's directory/content
//! structure with kind-specific pins.

mod error;

pub mod config;
pub mod lock;
pub mod resources;
pub mod sources;
pub mod version;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

pub use config::{Config, ContentConfig, DirectoryConfig, Source, API_VERSION, CONFIG_KIND};
pub use error::{Error, Result};
pub use lock::{LockConfig, LockContent, LockDirectory, SourceLock};
pub use resources::{ConfigMap, Secret};

/// A parsed config stream: the config document plus its resources.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub config: Config,
    pub secrets: BTreeMap<String, Secret>,
    pub config_maps: BTreeMap<String, ConfigMap>,
}

impl ConfigSet {
    /// Parse and validate a YAML document stream.
    pub fn from_str(content: &str, engine_version: &str) -> Result<Self> {
        let mut config: Option<Config> = None;
        let mut secrets = BTreeMap::new();
        let mut config_maps = BTreeMap::new();

        for doc in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(doc).map_err(|source| Error::Parse {
                what: "config document".to_string(),
                source,
            })?;
            if value.is_null() {
                continue;
            }

            let kind = value
                .get("kind")
                .and_then(|k| k.as_str())
                .unwrap_or_default()
                .to_string();

            match kind.as_str() {
                CONFIG_KIND => {
                    if config.is_some() {
                        return Err(Error::validation(
                            "config",
                            "expected exactly one Config document, found several",
                        ));
                    }
                    let parsed: Config =
                        serde_yaml::from_value(value).map_err(|source| Error::Parse {
                            what: "Config document".to_string(),
                            source,
                        })?;
                    config = Some(parsed);
                }
                "Secret" => {
                    let secret: Secret =
                        serde_yaml::from_value(value).map_err(|source| Error::Parse {
                            what: "Secret document".to_string(),
                            source,
                        })?;
                    secrets.insert(secret.metadata.name.clone(), secret);
                }
                "ConfigMap" => {
                    let cm: ConfigMap =
                        serde_yaml::from_value(value).map_err(|source| Error::Parse {
                            what: "ConfigMap document".to_string(),
                            source,
                        })?;
                    config_maps.insert(cm.metadata.name.clone(), cm);
                }
                other => {
                    return Err(Error::UnknownKind {
                        kind: other.to_string(),
                    })
                }
            }
        }

        let config = config.ok_or_else(|| {
            Error::validation("config", "expected a Config document, found none")
        })?;
        config.validate(engine_version)?;

        Ok(Self {
            config,
            secrets,
            config_maps,
        })
    }

    /// Read and parse the config file at `path`.
    pub fn load(path: &Path, engine_version: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content, engine_version)
    }
}

impl LockConfig {
    /// Parse and validate a lock document.
    pub fn parse(content: &str) -> Result<Self> {
        let lock: LockConfig = serde_yaml::from_str(content).map_err(|source| Error::Parse {
            what: "lock document".to_string(),
            source,
        })?;
        lock.validate()?;
        Ok(lock)
    }

    /// Read and parse the lock file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Serialize to the wire format.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| Error::Serialize {
            what: "lock document".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ENGINE: &str = "0.4.0";

    #[test]
    fn parses_minimal_config() {
        let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor/lib
  contents:
  - path: .
    manual: {}
"#;
        let set = ConfigSet::from_str(yaml, ENGINE).unwrap();
        assert_eq!(set.config.directories.len(), 1);
        assert_eq!(set.config.directories[0].contents[0].path, ".");
    }

    #[test]
    fn parses_stream_with_resources() {
        let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor
  contents:
  - path: creds
    inline:
      pathsFrom:
      - secretRef:
          name: my-secret
---
apiVersion: v1
kind: Secret
metadata:
  name: my-secret
stringData:
  token: hunter2
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: my-cm
data:
  key: value
"#;
        let set = ConfigSet::from_str(yaml, ENGINE).unwrap();
        assert!(set.secrets.contains_key("my-secret"));
        assert!(set.config_maps.contains_key("my-cm"));
    }

    #[test]
    fn rejects_unknown_kind() {
        let yaml = "apiVersion: v1\nkind: Deployment\n";
        assert!(matches!(
            ConfigSet::from_str(yaml, ENGINE),
            Err(Error::UnknownKind { .. })
        ));
    }

    #[test]
    fn rejects_missing_config_document() {
        let yaml = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n";
        assert!(ConfigSet::from_str(yaml, ENGINE).is_err());
    }

    #[test]
    fn rejects_wrong_api_version() {
        let yaml = "apiVersion: other/v9\nkind: Config\n";
        assert!(ConfigSet::from_str(yaml, ENGINE).is_err());
    }

    #[test]
    fn accepts_http_alias_for_http_archive() {
        let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor
  contents:
  - path: x
    http:
      url: https://example.com/x.tgz
"#;
        let set = ConfigSet::from_str(yaml, ENGINE).unwrap();
        let content = &set.config.directories[0].contents[0];
        assert!(content.http_archive.is_some());
    }

    #[test]
    fn lock_round_trip() {
        let mut lock = LockConfig::new();
        lock.upsert_directory(LockDirectory {
            path: "vendor/lib".to_string(),
            contents: vec![LockContent::new(
                ".",
                SourceLock::Git(lock::GitLock {
                    sha: "abcdef0123".to_string(),
                    tags: vec!["v0.1.0".to_string()],
                    commit_title: "initial commit".to_string(),
                }),
            )],
        });

        let yaml = lock.to_yaml_string().unwrap();
        let parsed = LockConfig::parse(&yaml).unwrap();
        assert_eq!(parsed, lock);
    }

    #[test]
    fn lock_rejects_wrong_kind() {
        let yaml = "apiVersion: vendo.dev/v1alpha1\nkind: Config\n";
        assert!(LockConfig::parse(yaml).is_err());
    }
}
