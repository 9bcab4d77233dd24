use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Conventional attribute carrying the delivery attempt count.
pub const RECEIVE_COUNT_ATTRIBUTE: &str = "ApproximateReceiveCount";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Purge failed: {0}")]
    Purge(String),

    #[error("Operation not supported by this transport: {0}")]
    Unsupported(&'static str),
}

/// A message exactly as the queue transport returned it, before any pointer
/// resolution.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub body: String,
    pub receipt_handle: String,
    pub message_id: String,
    pub attributes: HashMap<String, String>,
}

impl RawMessage {
    /// Delivery attempt count reported by the transport. Defaults to 1 when
    /// the attribute is missing or unparsable.
    pub fn approximate_receive_count(&self) -> u32 {
        self.attributes
            .get(RECEIVE_COUNT_ATTRIBUTE)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }
}

/// Queue depth snapshot, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepth {
    pub visible: u64,
    pub delayed: u64,
    pub in_flight: u64,
}

impl QueueDepth {
    pub fn total(&self) -> u64 {
        self.visible + self.delayed + self.in_flight
    }
}

/// Per-send options passed through to the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    pub delay: Option<Duration>,
}

impl SendOptions {
    pub fn delayed(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

/// Contract the underlying message-queue client must satisfy.
///
/// Visibility, leasing, and retry policy all live behind this trait; the
/// offload layer issues at most one transport call per operation and never
/// retries on its own.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Enqueue a body and return the transport-assigned message id.
    async fn send(
        &self,
        destination: &str,
        body: &str,
        options: SendOptions,
    ) -> Result<String, TransportError>;

    /// Receive up to `max_messages` messages. An empty vec means the queue
    /// had nothing visible; that is not an error.
    async fn receive(
        &self,
        destination: &str,
        max_messages: usize,
    ) -> Result<Vec<RawMessage>, TransportError>;

    /// Acknowledge a received message by its receipt handle.
    async fn delete(&self, destination: &str, receipt_handle: &str)
    -> Result<(), TransportError>;

    /// Make a received message visible again after `delay`.
    async fn release(
        &self,
        destination: &str,
        receipt_handle: &str,
        delay: Duration,
    ) -> Result<(), TransportError>;

    /// Drop every message in the queue.
    async fn purge(&self, destination: &str) -> Result<(), TransportError>;

    /// Report current queue depth. Never used to gate behavior.
    async fn queue_depth(&self, destination: &str) -> Result<QueueDepth, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_attributes(attributes: HashMap<String, String>) -> RawMessage {
        RawMessage {
            body: "{}".into(),
            receipt_handle: "handle".into(),
            message_id: "id".into(),
            attributes,
        }
    }

    #[test]
    fn receive_count_parses_attribute() {
        let mut attributes = HashMap::new();
        attributes.insert(RECEIVE_COUNT_ATTRIBUTE.to_string(), "4".to_string());
        assert_eq!(
            message_with_attributes(attributes).approximate_receive_count(),
            4
        );
    }

    #[test]
    fn receive_count_defaults_to_one() {
        assert_eq!(
            message_with_attributes(HashMap::new()).approximate_receive_count(),
            1
        );

        let mut attributes = HashMap::new();
        attributes.insert(RECEIVE_COUNT_ATTRIBUTE.to_string(), "junk".to_string());
        assert_eq!(
            message_with_attributes(attributes).approximate_receive_count(),
            1
        );
    }

    #[test]
    fn depth_total_sums_all_states() {
        let depth = QueueDepth {
            visible: 3,
            delayed: 2,
            in_flight: 1,
        };
        assert_eq!(depth.total(), 6);
    }
}
