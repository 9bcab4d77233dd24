use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed blob storage.
///
/// Keys are relative slash-separated paths (`prefix/name.json`). One trait
/// object is bound to exactly one backing store; selecting which store to
/// construct from a configured identifier happens at wiring time.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under the given key, replacing any existing object.
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes of an object. Fails with `NotFound` if absent.
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete one object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete_object(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete every object under `prefix` and return the number removed.
    ///
    /// A prefix with no objects is not an error.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, StorageError>;
}
