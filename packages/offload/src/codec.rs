use common::storage::{BlobStore, ContentHash};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::OffloadError;

/// Hard body-size limit of the underlying queue transport. Bodies above this
/// cannot be sent directly and must be offloaded.
pub const MAX_QUEUE_BODY_BYTES: usize = 262_144;

/// Envelope field holding the producer-assigned identifier, used verbatim as
/// the object key when present.
const IDENTIFIER_FIELD: &str = "uuid";

/// Envelope field carrying routing metadata, copied onto the pointer so
/// consumers can route without fetching the blob.
const JOB_FIELD: &str = "job";

/// Offload behavior for one queue, fixed at construction.
#[derive(Debug, Clone)]
pub struct OffloadPolicy {
    /// Offload every body regardless of size.
    pub always_store: bool,
    /// Delete the backing object when an offloaded job is acknowledged.
    pub cleanup_on_delete: bool,
    /// Identifier of the blob store backing this queue.
    pub store: String,
    /// Non-empty path segment namespacing all offloaded objects.
    pub prefix: String,
}

/// Substitute wire body for an offloaded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEnvelope {
    /// Object key of the offloaded payload: `{prefix}/{key}.json`.
    pub pointer: String,
    /// Routing metadata copied from the original envelope, if it had any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
}

/// Shape of a wire body, decided once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// The body is the payload itself.
    Direct(String),
    /// The body points at an offloaded payload in the blob store.
    Pointer { key: String, job: Option<String> },
}

impl Envelope {
    /// Classify a raw wire body by structure.
    ///
    /// Only a JSON object with a non-empty string `pointer` field counts as
    /// a pointer; everything else, malformed JSON included, is a direct
    /// payload.
    pub fn classify(body: &str) -> Self {
        match serde_json::from_str::<PointerEnvelope>(body) {
            Ok(envelope) if !envelope.pointer.is_empty() => Self::Pointer {
                key: envelope.pointer,
                job: envelope.job,
            },
            _ => Self::Direct(body.to_string()),
        }
    }
}

/// Whether a body must be offloaded under the given policy.
pub fn should_offload(body: &str, policy: &OffloadPolicy) -> bool {
    policy.always_store || body.len() > MAX_QUEUE_BODY_BYTES
}

/// Deterministic object key for an envelope.
///
/// A non-empty string identifier field wins; otherwise the key is the hex
/// SHA-256 of the exact body bytes, so retried pushes of an identical
/// payload land on the same object. Malformed JSON takes the digest path
/// rather than failing.
pub fn object_key(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(id) = value.get(IDENTIFIER_FIELD).and_then(Value::as_str) {
            if !id.is_empty() {
                return id.to_string();
            }
        }
    }
    ContentHash::compute(body.as_bytes()).to_hex()
}

/// Full object path for a key under the policy's prefix.
pub fn object_path(policy: &OffloadPolicy, key: &str) -> String {
    format!("{}/{key}.json", policy.prefix)
}

/// Build the substitute pointer body, copying the `job` field through.
pub fn pointer_envelope(policy: &OffloadPolicy, key: &str, body: &str) -> PointerEnvelope {
    let job = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get(JOB_FIELD).and_then(Value::as_str).map(String::from));

    PointerEnvelope {
        pointer: object_path(policy, key),
        job,
    }
}

/// Outcome of running the offload decision over one body.
#[derive(Debug)]
pub struct Encoded {
    /// Body to put on the wire: the original, or the pointer substitute.
    pub body: String,
    /// Object key the payload was offloaded to, when it was.
    pub offloaded_key: Option<String>,
}

/// Apply the offload decision to a body, writing the original payload to the
/// blob store when offloading.
///
/// The blob write happens before anything touches the queue; a write failure
/// aborts the push so a pointer is never sent without its backing object.
pub async fn encode(
    body: &str,
    policy: &OffloadPolicy,
    store: &dyn BlobStore,
) -> Result<Encoded, OffloadError> {
    if !should_offload(body, policy) {
        return Ok(Encoded {
            body: body.to_string(),
            offloaded_key: None,
        });
    }

    let key = object_key(body);
    let path = object_path(policy, &key);

    store
        .write(&path, body.as_bytes())
        .await
        .map_err(OffloadError::StorageWrite)?;
    debug!(key = %path, bytes = body.len(), "Offloaded payload to blob store");

    let pointer = serde_json::to_string(&pointer_envelope(policy, &key, body))?;

    Ok(Encoded {
        body: pointer,
        offloaded_key: Some(path),
    })
}
