use common::storage::StorageError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced to callers of the offload layer.
///
/// Cleanup-phase storage failures never appear here; they are downgraded to
/// warn logs and reported through [`crate::job::CleanupOutcome`] so an
/// unrelated storage blip cannot cause infinite redelivery.
#[derive(Debug, Error)]
pub enum OffloadError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The blob write backing an offload failed; the push is aborted so a
    /// dangling pointer is never sent.
    #[error("Blob write failed: {0}")]
    StorageWrite(StorageError),

    /// Fetching an offloaded payload failed; the queue message stays
    /// undeleted so transport redelivery applies.
    #[error("Blob read failed: {0}")]
    StorageRead(StorageError),

    /// The object behind a pointer is not valid UTF-8.
    #[error("Offloaded payload at {key} is not valid UTF-8")]
    CorruptPayload { key: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid offload policy: {0}")]
    InvalidPolicy(String),
}
