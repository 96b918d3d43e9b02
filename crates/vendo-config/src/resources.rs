//! Secret and ConfigMap resources declared alongside the config.
//!
//! The config file is a YAML document stream: one `Config` plus any number
//! of `Secret`/`ConfigMap` documents. Fetchers resolve symbolic references
//! to these through the engine's ref fetcher rather than reading ambient
//! credentials.

use std::collections::BTreeMap;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceMeta {
    pub name: String,
}

/// Credential material. `data` values are base64; `stringData` values are
/// plaintext and win per key when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Secret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub metadata: ResourceMeta,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
}

/// Plain (non-secret) file material for inline contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub metadata: ResourceMeta,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    /// Decoded key/value material, `stringData` overlaid on decoded `data`.
    pub fn decoded_data(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut out = BTreeMap::new();

        for (key, val) in &self.data {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(val)
                .map_err(|source| Error::SecretData {
                    name: self.metadata.name.clone(),
                    key: key.clone(),
                    source,
                })?;
            out.insert(key.clone(), bytes);
        }

        for (key, val) in &self.string_data {
            out.insert(key.clone(), val.as_bytes().to_vec());
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(data: &[(&str, &str)], string_data: &[(&str, &str)]) -> Secret {
        Secret {
            api_version: None,
            kind: "Secret".to_string(),
            metadata: ResourceMeta {
                name: "s".to_string(),
            },
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            string_data: string_data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn decodes_base64_data() {
        let s = secret(&[("username", "Ym9i")], &[]);
        let data = s.decoded_data().unwrap();
        assert_eq!(data["username"], b"bob");
    }

    #[test]
    fn string_data_wins() {
        let s = secret(&[("k", "Ym9i")], &[("k", "alice")]);
        let data = s.decoded_data().unwrap();
        assert_eq!(data["k"], b"alice");
    }

    #[test]
    fn invalid_base64_is_error() {
        let s = secret(&[("k", "!!not-base64!!")], &[]);
        assert!(s.decoded_data().is_err());
    }
}
