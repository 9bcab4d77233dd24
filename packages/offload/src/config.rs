use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::codec::OffloadPolicy;

/// Offload configuration for one queue.
#[derive(Debug, Deserialize, Clone)]
pub struct OffloadConfig {
    /// Offload every body regardless of size. Default: false.
    #[serde(default)]
    pub always_store: bool,
    /// Delete backing objects when acknowledged jobs are offloaded. Default: true.
    #[serde(default = "default_cleanup")]
    pub cleanup: bool,
    /// Identifier of the blob store to offload to. Default: "blobs".
    #[serde(default = "default_store")]
    pub store: String,
    /// Key prefix namespacing this queue's offloaded objects. Default: "offload".
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Queue destination name. Default: "default".
    #[serde(default = "default_queue")]
    pub queue: String,
}

fn default_cleanup() -> bool {
    true
}
fn default_store() -> String {
    "blobs".into()
}
fn default_prefix() -> String {
    "offload".into()
}
fn default_queue() -> String {
    "default".into()
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            always_store: false,
            cleanup: default_cleanup(),
            store: default_store(),
            prefix: default_prefix(),
            queue: default_queue(),
        }
    }
}

impl OffloadConfig {
    /// Load from `config/offload.toml` (optional) with environment overrides
    /// (e.g. `OFFLOAD__ALWAYS_STORE=true`).
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/offload").required(false))
            .add_source(Environment::with_prefix("OFFLOAD").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// The immutable policy handed to the queue facade.
    pub fn policy(&self) -> OffloadPolicy {
        OffloadPolicy {
            always_store: self.always_store,
            cleanup_on_delete: self.cleanup,
            store: self.store.clone(),
            prefix: self.prefix.clone(),
        }
    }
}
