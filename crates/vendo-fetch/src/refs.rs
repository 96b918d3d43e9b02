//! Symbolic reference resolution.
//!
//! Fetchers never read ambient credentials; they name a `Secret` or
//! `ConfigMap` and the engine resolves it from the resources declared in
//! the config stream.

use vendo_config::{ConfigMap, ConfigSet, Secret};

use crate::error::{Error, Result};

/// Resolves symbolic references to their concrete material.
pub trait RefFetcher {
    fn secret(&self, name: &str) -> Result<Secret>;
    fn config_map(&self, name: &str) -> Result<ConfigMap>;
}

/// RefFetcher backed by the resources parsed from the config stream.
pub struct ResourceRefFetcher<'a> {
    set: &'a ConfigSet,
}

impl<'a> ResourceRefFetcher<'a> {
    pub fn new(set: &'a ConfigSet) -> Self {
        Self { set }
    }
}

impl RefFetcher for ResourceRefFetcher<'_> {
    fn secret(&self, name: &str) -> Result<Secret> {
        self.set
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| {
                Error::Config(vendo_config::Error::ResourceNotFound {
                    kind: "Secret".to_string(),
                    name: name.to_string(),
                })
            })
    }

    fn config_map(&self, name: &str) -> Result<ConfigMap> {
        self.set
            .config_maps
            .get(name)
            .cloned()
            .ok_or_else(|| {
                Error::Config(vendo_config::Error::ResourceNotFound {
                    kind: "ConfigMap".to_string(),
                    name: name.to_string(),
                })
            })
    }
}
