use std::path::Path;

use anyhow::Context;
use hdl_client::ObjectConfig;
use hdl_index::IndexRange;
use hdl_profile::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

/// Contents of the `hdl` configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub handle: HandleConfig,
    pub store: StoreConfig,
    pub index: IndexRange,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    pub prefix: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub namespace: String,
    pub server: String,
    pub port: u16,
    pub url_prefix: String,
    pub webdav_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            server: "localhost".to_string(),
            port: 1247,
            url_prefix: String::new(),
            webdav_prefix: String::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.index.min >= config.index.max {
            anyhow::bail!(
                "empty index range [{}, {})",
                config.index.min,
                config.index.max
            );
        }
        Ok(config)
    }

    pub fn object_config(&self) -> ObjectConfig {
        let webdav = Some(self.store.webdav_prefix.clone()).filter(|p| !p.is_empty());
        ObjectConfig {
            handle_prefix: self.handle.prefix.clone(),
            namespace: self.store.namespace.clone(),
            server: self.store.server.clone(),
            port: self.store.port,
            url_prefix: self.store.url_prefix.clone(),
            webdav_prefix: webdav,
            index: self.index,
        }
    }
}
