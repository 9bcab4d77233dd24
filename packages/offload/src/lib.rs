pub mod codec;
pub mod config;
pub mod error;
pub mod job;
pub mod queue;
pub mod transport;

pub use codec::{Envelope, MAX_QUEUE_BODY_BYTES, OffloadPolicy, PointerEnvelope};
pub use config::OffloadConfig;
pub use error::OffloadError;
pub use job::{CleanupOutcome, Job};
pub use queue::OffloadQueue;
pub use transport::{QueueDepth, QueueTransport, RawMessage, SendOptions, TransportError};
