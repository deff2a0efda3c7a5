use std::fmt;

use serde::{Deserialize, Serialize};

/// Broker-assigned message identifier: a monotonically increasing 64-bit
/// value, never reused. A restored message always receives a fresh one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Metadata record for one physical message instance.
///
/// `destination` is the user-visible logical name; `storage_queue` is the
/// node-local physical queue derived from (destination, node, kind). The two
/// must be recomputed together when a message is rerouted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    pub id: MessageId,
    pub destination: String,
    pub storage_queue: String,
    pub exchange: String,
    pub routing_key: String,
    /// Total content length in bytes across all parts; content itself is
    /// addressed by `id` in the content column family.
    pub content_length: u64,
    pub published_at: u64,
}

/// One opaque content chunk. Parts are ordered by `index` and immutable once
/// fetched for a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    pub index: u32,
    pub data: Vec<u8>,
}

/// A fully formed outbound message handed to the kernel's admission path.
#[derive(Debug, Clone)]
pub struct Message {
    pub metadata: MessageMetadata,
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn new(metadata: MessageMetadata, parts: Vec<ContentPart>) -> Self {
        Self { metadata, parts }
    }
}

/// Publisher-acknowledgement marker on admission. Internal re-injections
/// (dead-letter restore) suppress the acknowledgement; the kernel skips ack
/// bookkeeping for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    PublisherAck,
    Suppressed,
}
