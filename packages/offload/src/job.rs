use std::sync::Arc;
use std::time::Duration;

use common::storage::StorageError;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::codec::Envelope;
use crate::error::OffloadError;
use crate::queue::Shared;
use crate::transport::RawMessage;

/// What happened to the backing blob when a job was acknowledged.
#[derive(Debug)]
pub enum CleanupOutcome {
    /// Nothing to delete: the job was not offloaded, or cleanup is disabled.
    Skipped,
    /// The backing object was deleted.
    Removed,
    /// The queue message was acknowledged but the blob delete failed.
    /// Surfaced for logging/metrics; the acknowledgement stands.
    Failed(StorageError),
}

struct Resolved {
    body: String,
    pointer_key: Option<String>,
}

/// A popped message, with lazy pointer resolution.
///
/// The raw wire body is inspected on first [`body`](Self::body) access;
/// pointer envelopes are dereferenced from the blob store exactly once and
/// cached. On successful processing, [`delete`](Self::delete) removes the
/// queue message and, policy permitting, the backing blob. On failure,
/// [`release`](Self::release) puts the message back without touching the
/// blob, since a retry still needs it.
pub struct Job {
    shared: Arc<Shared>,
    message: RawMessage,
    resolved: OnceCell<Resolved>,
}

impl Job {
    pub(crate) fn new(shared: Arc<Shared>, message: RawMessage) -> Self {
        Self {
            shared,
            message,
            resolved: OnceCell::new(),
        }
    }

    /// The wire body as received, pointer envelope or not.
    pub fn raw_body(&self) -> &str {
        &self.message.body
    }

    pub fn message_id(&self) -> &str {
        &self.message.message_id
    }

    pub fn receipt_handle(&self) -> &str {
        &self.message.receipt_handle
    }

    /// Delivery attempt count reported by the transport.
    pub fn attempts(&self) -> u32 {
        self.message.approximate_receive_count()
    }

    /// Object key behind this job's pointer, if it has one.
    ///
    /// Uses the cached resolution when present, otherwise classifies the raw
    /// body, so cleanup works even for jobs that were never resolved.
    pub fn pointer_key(&self) -> Option<String> {
        match self.resolved.get() {
            Some(resolved) => resolved.pointer_key.clone(),
            None => match Envelope::classify(&self.message.body) {
                Envelope::Pointer { key, .. } => Some(key),
                Envelope::Direct(_) => None,
            },
        }
    }

    pub fn is_offloaded(&self) -> bool {
        self.pointer_key().is_some()
    }

    /// The real payload body, fetching it from the blob store on first
    /// access when the wire body is a pointer.
    ///
    /// A fetch failure leaves the queue message undeleted, so the
    /// transport's redelivery or dead-letter handling applies.
    pub async fn body(&self) -> Result<&str, OffloadError> {
        let resolved = self.resolved.get_or_try_init(|| self.resolve()).await?;
        Ok(&resolved.body)
    }

    async fn resolve(&self) -> Result<Resolved, OffloadError> {
        match Envelope::classify(&self.message.body) {
            Envelope::Direct(body) => Ok(Resolved {
                body,
                pointer_key: None,
            }),
            Envelope::Pointer { key, .. } => {
                let bytes = self
                    .shared
                    .store()
                    .read(&key)
                    .await
                    .map_err(OffloadError::StorageRead)?;
                let body = String::from_utf8(bytes)
                    .map_err(|_| OffloadError::CorruptPayload { key: key.clone() })?;

                debug!(key = %key, bytes = body.len(), "Resolved offloaded payload");

                Ok(Resolved {
                    body,
                    pointer_key: Some(key),
                })
            }
        }
    }

    /// Acknowledge successful processing: delete the queue message, then
    /// best-effort delete the backing blob when the policy asks for cleanup.
    ///
    /// The queue delete is authoritative. A blob-delete failure afterwards
    /// is reported as [`CleanupOutcome::Failed`] but does not undo the
    /// acknowledgement.
    pub async fn delete(self) -> Result<CleanupOutcome, OffloadError> {
        self.shared
            .transport
            .delete(&self.shared.destination, &self.message.receipt_handle)
            .await?;
        debug!(message_id = %self.message.message_id, "Acknowledged queue message");

        if !self.shared.policy.cleanup_on_delete {
            return Ok(CleanupOutcome::Skipped);
        }
        let Some(key) = self.pointer_key() else {
            return Ok(CleanupOutcome::Skipped);
        };

        match self.shared.store().delete_object(&key).await {
            Ok(_) => {
                debug!(key = %key, "Removed offloaded payload");
                Ok(CleanupOutcome::Removed)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Blob cleanup failed after queue delete");
                Ok(CleanupOutcome::Failed(err))
            }
        }
    }

    /// Put the message back for redelivery after `delay`.
    ///
    /// The blob is never deleted here: a redelivered job still needs it.
    pub async fn release(self, delay: Duration) -> Result<(), OffloadError> {
        self.shared
            .transport
            .release(&self.shared.destination, &self.message.receipt_handle, delay)
            .await?;
        debug!(
            message_id = %self.message.message_id,
            delay = ?delay,
            "Released message for redelivery"
        );
        Ok(())
    }
}
