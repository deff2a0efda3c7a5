use serde::{Deserialize, Serialize};

/// Destination kind. The physical storage queue backing a destination is
/// derived from (destination, owning node, kind), so the kind participates in
/// storage-queue resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Queue,
    Topic,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::Queue => "queue",
            DestinationKind::Topic => "topic",
        }
    }
}

/// Destination record stored in the `destinations` column family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DestinationRecord {
    pub name: String,
    pub kind: DestinationKind,
    /// Node-local physical queue name, resolved at creation time.
    pub storage_queue: String,
    pub created_at: u64,
}
