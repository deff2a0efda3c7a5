use crate::destination::DestinationRecord;
use crate::error::StorageResult;
use crate::message::MessageMetadata;
use crate::subscription::SubscriptionRecord;

/// Represents a single operation in an atomic write batch.
#[derive(Debug)]
pub enum WriteBatchOp {
    PutMessage { key: Vec<u8>, value: Vec<u8> },
    DeleteMessage { key: Vec<u8> },
    PutContent { key: Vec<u8>, value: Vec<u8> },
    DeleteContent { key: Vec<u8> },
    PutIndex { key: Vec<u8>, value: Vec<u8> },
    DeleteIndex { key: Vec<u8> },
    PutState { key: Vec<u8>, value: Vec<u8> },
}

/// Storage trait for all persistence operations. Implementations must be
/// thread-safe; storage operations fail only with infrastructure errors.
pub trait Storage: Send + Sync {
    // --- Message metadata rows ---

    /// Store a metadata row under its full key.
    fn put_message(&self, key: &[u8], metadata: &MessageMetadata) -> StorageResult<()>;

    /// Retrieve a metadata row by its full key.
    fn get_message(&self, key: &[u8]) -> StorageResult<Option<MessageMetadata>>;

    /// List metadata rows whose keys start with the given prefix, in
    /// lexicographic (ascending identifier) order.
    fn list_messages(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, MessageMetadata)>>;

    /// Count rows under a prefix without deserializing values. An empty
    /// prefix counts every row.
    fn count_messages(&self, prefix: &[u8]) -> StorageResult<u64>;

    // --- Content parts ---

    /// Store one content part.
    fn put_content(&self, key: &[u8], data: &[u8]) -> StorageResult<()>;

    /// List content parts under a prefix in part order.
    fn list_content(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;

    // --- Identifier index ---

    /// Point an identifier at a message row key.
    fn put_index(&self, key: &[u8], row_key: &[u8]) -> StorageResult<()>;

    /// Resolve an identifier to its current message row key.
    fn get_index(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    // --- Destinations ---

    fn put_destination(&self, name: &str, record: &DestinationRecord) -> StorageResult<()>;
    fn get_destination(&self, name: &str) -> StorageResult<Option<DestinationRecord>>;
    fn delete_destination(&self, name: &str) -> StorageResult<()>;
    fn list_destinations(&self) -> StorageResult<Vec<DestinationRecord>>;

    // --- Subscriptions ---

    fn put_subscription(&self, id: &str, record: &SubscriptionRecord) -> StorageResult<()>;
    fn get_subscription(&self, id: &str) -> StorageResult<Option<SubscriptionRecord>>;
    fn delete_subscription(&self, id: &str) -> StorageResult<()>;
    fn list_subscriptions(&self) -> StorageResult<Vec<SubscriptionRecord>>;

    // --- State ---

    fn put_state(&self, key: &str, value: &[u8]) -> StorageResult<()>;
    fn get_state(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    // --- Batch operations ---

    /// Atomically apply a batch of write operations across column families.
    fn write_batch(&self, ops: Vec<WriteBatchOp>) -> StorageResult<()>;
}
