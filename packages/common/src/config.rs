use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base directory for the filesystem store. Default: "./data/blobs".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Maximum size of a single stored object in bytes. Default: 64 MiB.
    #[serde(default = "default_max_object_bytes")]
    pub max_object_bytes: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_object_bytes() -> u64 {
    64 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_object_bytes: default_max_object_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = StorageConfig::default();
        assert_eq!(config.root, PathBuf::from("./data/blobs"));
        assert_eq!(config.max_object_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: StorageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_object_bytes, 64 * 1024 * 1024);
    }
}
