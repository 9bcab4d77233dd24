use std::sync::{Arc, OnceLock};
use std::time::Duration;

use common::storage::BlobStore;
use tracing::{debug, info, warn};

use crate::codec::{self, OffloadPolicy};
use crate::error::OffloadError;
use crate::job::Job;
use crate::transport::{QueueDepth, QueueTransport, SendOptions};

/// Constructs the blob store on first use, so queues that never offload
/// never pay for one.
pub type StoreFactory = Box<dyn Fn() -> Arc<dyn BlobStore> + Send + Sync>;

/// State shared between a queue facade and the jobs it hands out.
pub(crate) struct Shared {
    pub(crate) transport: Arc<dyn QueueTransport>,
    pub(crate) destination: String,
    pub(crate) policy: OffloadPolicy,
    store_factory: StoreFactory,
    store: OnceLock<Arc<dyn BlobStore>>,
}

impl Shared {
    /// Blob store handle, bound lazily on first use.
    pub(crate) fn store(&self) -> &Arc<dyn BlobStore> {
        self.store.get_or_init(|| (self.store_factory)())
    }
}

/// Queue facade that transparently offloads oversized bodies to a blob
/// store, substituting a small pointer envelope on the wire.
///
/// Producers and consumers use it like a plain queue client; the pointer
/// indirection is invisible on both sides.
pub struct OffloadQueue {
    shared: Arc<Shared>,
}

impl OffloadQueue {
    /// Create a facade over `transport`, binding the blob store lazily via
    /// `store_factory`.
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        destination: impl Into<String>,
        policy: OffloadPolicy,
        store_factory: StoreFactory,
    ) -> Result<Self, OffloadError> {
        if policy.prefix.is_empty() {
            return Err(OffloadError::InvalidPolicy("prefix must not be empty".into()));
        }
        if policy.prefix.starts_with('/') || policy.prefix.ends_with('/') {
            return Err(OffloadError::InvalidPolicy(format!(
                "prefix must be a bare path segment, got {:?}",
                policy.prefix
            )));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                destination: destination.into(),
                policy,
                store_factory,
                store: OnceLock::new(),
            }),
        })
    }

    /// Create a facade with an already-constructed blob store.
    pub fn with_store(
        transport: Arc<dyn QueueTransport>,
        destination: impl Into<String>,
        policy: OffloadPolicy,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self, OffloadError> {
        Self::new(transport, destination, policy, Box::new(move || store.clone()))
    }

    pub fn destination(&self) -> &str {
        &self.shared.destination
    }

    pub fn policy(&self) -> &OffloadPolicy {
        &self.shared.policy
    }

    /// Push a raw serialized body, offloading it first if the policy says so.
    pub async fn push_raw(&self, body: &str) -> Result<String, OffloadError> {
        self.send(body, SendOptions::default()).await
    }

    /// Push with a delivery delay. Delay and offload are orthogonal: the
    /// offload decision is identical to [`push_raw`](Self::push_raw).
    pub async fn later(&self, delay: Duration, body: &str) -> Result<String, OffloadError> {
        self.send(body, SendOptions::delayed(delay)).await
    }

    async fn send(&self, body: &str, options: SendOptions) -> Result<String, OffloadError> {
        // Pass-through sends must not bind the store, so the decision runs
        // before encode.
        let encoded = if codec::should_offload(body, &self.shared.policy) {
            codec::encode(body, &self.shared.policy, self.shared.store().as_ref()).await?
        } else {
            codec::Encoded {
                body: body.to_string(),
                offloaded_key: None,
            }
        };

        let message_id = self
            .shared
            .transport
            .send(&self.shared.destination, &encoded.body, options)
            .await?;

        debug!(
            message_id = %message_id,
            destination = %self.shared.destination,
            offloaded = encoded.offloaded_key.is_some(),
            delay = ?options.delay,
            "Pushed message"
        );

        Ok(message_id)
    }

    /// Receive at most one message and wrap it as a [`Job`].
    ///
    /// Pointer resolution is deferred to the job's first body access, so
    /// jobs that are discarded unprocessed never pay the blob fetch.
    pub async fn pop(&self) -> Result<Option<Job>, OffloadError> {
        let messages = self
            .shared
            .transport
            .receive(&self.shared.destination, 1)
            .await?;

        match messages.into_iter().next() {
            Some(message) => {
                debug!(
                    message_id = %message.message_id,
                    destination = %self.shared.destination,
                    "Popped message"
                );
                Ok(Some(Job::new(self.shared.clone(), message)))
            }
            None => Ok(None),
        }
    }

    /// Queue depth snapshot, for diagnostics.
    pub async fn depth(&self) -> Result<QueueDepth, OffloadError> {
        Ok(self
            .shared
            .transport
            .queue_depth(&self.shared.destination)
            .await?)
    }

    /// Destructively clear the queue: remove every offloaded object under
    /// the policy prefix, then purge all queue messages. Both effects always
    /// run, whatever the current depth.
    ///
    /// Returns the pre-purge total depth.
    pub async fn clear(&self) -> Result<u64, OffloadError> {
        let depth = match self
            .shared
            .transport
            .queue_depth(&self.shared.destination)
            .await
        {
            Ok(depth) => depth.total(),
            // Depth is informational only; a failed read must not stop the
            // clearing effects.
            Err(err) => {
                warn!(
                    destination = %self.shared.destination,
                    error = %err,
                    "Failed to read queue depth before clear"
                );
                0
            }
        };

        // Prefix delete goes first so an in-flight message never references
        // a half-cleared prefix.
        match self
            .shared
            .store()
            .delete_prefix(&self.shared.policy.prefix)
            .await
        {
            Ok(removed) => {
                debug!(
                    prefix = %self.shared.policy.prefix,
                    removed,
                    "Cleared offloaded objects"
                );
            }
            Err(err) => {
                warn!(
                    prefix = %self.shared.policy.prefix,
                    error = %err,
                    "Failed to clear offloaded objects"
                );
            }
        }

        self.shared.transport.purge(&self.shared.destination).await?;
        info!(destination = %self.shared.destination, depth, "Queue purged");

        Ok(depth)
    }
}
