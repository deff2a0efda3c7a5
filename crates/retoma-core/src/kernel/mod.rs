use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::config::KernelConfig;
use crate::destination::{DestinationKind, DestinationRecord};
use crate::error::{KernelError, StorageError, StorageResult};
use crate::flow::FlowControlChannel;
use crate::message::{AckMode, ContentPart, Message, MessageId, MessageMetadata};
use crate::storage::{keys, Storage, WriteBatchOp};
use crate::subscription::SubscriptionRecord;

mod monitor;

pub use monitor::ResourceMonitor;

/// The broker-kernel boundary consumed by the admin layer.
///
/// Injected explicitly into the restore engine and resource facade at
/// construction so both stay testable against a substitutable kernel.
pub trait Kernel: Send + Sync {
    /// Bulk-fetch content parts for a batch of identifiers. Identifiers with
    /// no stored content are absent from the returned map.
    fn content(
        &self,
        ids: &[MessageId],
    ) -> StorageResult<HashMap<MessageId, Vec<ContentPart>>>;

    /// Fetch the metadata record for a single identifier.
    fn metadata(&self, id: MessageId) -> Result<MessageMetadata, KernelError>;

    /// Resolve the node-local storage queue backing a destination.
    fn storage_queue(&self, destination: &str, kind: DestinationKind) -> String;

    /// Admission path: persist a fully formed outbound message as live,
    /// assigning it a brand-new identifier.
    fn admit(&self, message: Message, ack: AckMode) -> StorageResult<MessageId>;

    /// Bulk-remove identifiers from the given dead-letter destination.
    /// Identifiers that are absent, or whose rows are held by a different
    /// destination, are skipped; the delete never reaches live rows.
    fn delete_from_dead_letter_store(
        &self,
        source: &str,
        records: &[MessageMetadata],
    ) -> StorageResult<()>;

    /// Construct and register a flow-control channel. The kernel's resource
    /// monitor drives block/unblock transitions on every registered channel.
    fn create_channel(&self) -> Arc<FlowControlChannel>;

    // --- Delegation surface for the resource facade ---

    fn create_destination(
        &self,
        name: &str,
        kind: DestinationKind,
    ) -> Result<DestinationRecord, KernelError>;
    fn destination(&self, name: &str) -> StorageResult<Option<DestinationRecord>>;
    fn delete_destination(&self, name: &str) -> Result<(), KernelError>;
    fn destinations(&self) -> StorageResult<Vec<DestinationRecord>>;

    /// All metadata rows currently held by a destination, in ascending
    /// identifier order. Full scan of the destination's prefix; browse is an
    /// administrative operation, not a delivery path.
    fn messages(&self, destination: &str) -> StorageResult<Vec<MessageMetadata>>;
    fn message(
        &self,
        destination: &str,
        id: MessageId,
    ) -> StorageResult<Option<MessageMetadata>>;

    /// Remove every message held by a destination. Returns the purged count.
    fn purge(&self, destination: &str) -> StorageResult<u64>;

    /// Number of messages currently held by a destination.
    fn message_count(&self, destination: &str) -> StorageResult<u64>;

    fn subscriptions(&self) -> StorageResult<Vec<SubscriptionRecord>>;
    fn remove_subscription(&self, id: &str) -> Result<(), KernelError>;

    /// Total stored message count, read by the resource monitor.
    fn stored_message_count(&self) -> StorageResult<u64>;
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Parse the big-endian part index from the tail of a content key.
fn part_index_from_key(key: &[u8]) -> StorageResult<u32> {
    let tail: [u8; 4] = key
        .get(key.len().saturating_sub(4)..)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| StorageError::CorruptData("content key shorter than part index".into()))?;
    Ok(u32::from_be_bytes(tail))
}

/// RocksDB-backed kernel for a single node.
///
/// Owns the identifier counter (seeded from persisted state so identifiers
/// stay monotonic across restarts) and the registry of flow-control channels.
pub struct NodeKernel {
    storage: Arc<dyn Storage>,
    node_id: String,
    next_id: AtomicU64,
    channels: Mutex<Vec<Arc<FlowControlChannel>>>,
}

impl NodeKernel {
    pub fn new(storage: Arc<dyn Storage>, config: &KernelConfig) -> StorageResult<Self> {
        let last_id = match storage.get_state(keys::LAST_MESSAGE_ID)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StorageError::CorruptData("last_message_id state is not 8 bytes".into())
                })?;
                u64::from_be_bytes(arr)
            }
            None => 0,
        };

        info!(node_id = %config.node_id, last_id, "kernel opened");

        Ok(Self {
            storage,
            node_id: config.node_id.clone(),
            next_id: AtomicU64::new(last_id),
            channels: Mutex::new(Vec::new()),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Move a live message into the dead-letter store. The row is re-keyed
    /// under the dead-letter destination; the metadata keeps recording the
    /// original destination so a later restore knows where to send it back.
    pub fn dead_letter(&self, id: MessageId, dlc_destination: &str) -> Result<(), KernelError> {
        let old_key = self
            .storage
            .get_index(&keys::id_index_key(id))?
            .ok_or(KernelError::MessageNotFound(id))?;
        let metadata = self
            .storage
            .get_message(&old_key)?
            .ok_or(KernelError::MessageNotFound(id))?;

        let dlc_key = keys::message_key(dlc_destination, id);
        self.storage.write_batch(vec![
            WriteBatchOp::DeleteMessage { key: old_key },
            WriteBatchOp::PutMessage {
                key: dlc_key.clone(),
                value: serde_json::to_vec(&metadata).map_err(StorageError::from)?,
            },
            WriteBatchOp::PutIndex {
                key: keys::id_index_key(id),
                value: dlc_key,
            },
        ])?;

        debug!(%id, destination = %metadata.destination, dlc = %dlc_destination, "message dead-lettered");
        Ok(())
    }

    /// Entry point for the subscription layer (and tests): record a
    /// subscription so the admin surface can list and close it.
    pub fn register_subscription(&self, record: SubscriptionRecord) -> StorageResult<()> {
        debug!(id = %record.id, destination = %record.destination, "subscription registered");
        self.storage.put_subscription(&record.id, &record)
    }

    /// Block every registered flow-control channel. Invoked by the resource
    /// monitor when the high watermark is crossed.
    pub fn block_channels(&self) {
        let channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        for channel in channels.iter() {
            channel.block();
        }
    }

    /// Unblock every registered flow-control channel.
    pub fn unblock_channels(&self) {
        let channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        for channel in channels.iter() {
            channel.unblock();
        }
    }

    fn delete_ops_for_row(
        &self,
        row_key: Vec<u8>,
        id: MessageId,
        ops: &mut Vec<WriteBatchOp>,
    ) -> StorageResult<()> {
        for (content_key, _) in self.storage.list_content(&keys::content_prefix(id))? {
            ops.push(WriteBatchOp::DeleteContent { key: content_key });
        }
        ops.push(WriteBatchOp::DeleteIndex {
            key: keys::id_index_key(id),
        });
        ops.push(WriteBatchOp::DeleteMessage { key: row_key });
        Ok(())
    }
}

impl Kernel for NodeKernel {
    fn content(
        &self,
        ids: &[MessageId],
    ) -> StorageResult<HashMap<MessageId, Vec<ContentPart>>> {
        let mut out = HashMap::with_capacity(ids.len());
        for &id in ids {
            let rows = self.storage.list_content(&keys::content_prefix(id))?;
            if rows.is_empty() {
                continue;
            }
            let mut parts = Vec::with_capacity(rows.len());
            for (key, data) in rows {
                parts.push(ContentPart {
                    index: part_index_from_key(&key)?,
                    data,
                });
            }
            out.insert(id, parts);
        }
        Ok(out)
    }

    fn metadata(&self, id: MessageId) -> Result<MessageMetadata, KernelError> {
        let row_key = self
            .storage
            .get_index(&keys::id_index_key(id))?
            .ok_or(KernelError::MessageNotFound(id))?;
        self.storage
            .get_message(&row_key)?
            .ok_or(KernelError::MessageNotFound(id))
    }

    fn storage_queue(&self, destination: &str, kind: DestinationKind) -> String {
        format!("{}:{}:{}", kind.as_str(), destination, self.node_id)
    }

    fn admit(&self, message: Message, ack: AckMode) -> StorageResult<MessageId> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);

        let mut metadata = message.metadata;
        metadata.id = id;
        metadata.content_length = message.parts.iter().map(|p| p.data.len() as u64).sum();

        let row_key = keys::message_key(&metadata.destination, id);
        let mut ops = Vec::with_capacity(message.parts.len() + 3);
        ops.push(WriteBatchOp::PutMessage {
            key: row_key.clone(),
            value: serde_json::to_vec(&metadata)?,
        });
        for part in &message.parts {
            ops.push(WriteBatchOp::PutContent {
                key: keys::content_key(id, part.index),
                value: part.data.clone(),
            });
        }
        ops.push(WriteBatchOp::PutIndex {
            key: keys::id_index_key(id),
            value: row_key,
        });
        ops.push(WriteBatchOp::PutState {
            key: keys::LAST_MESSAGE_ID.as_bytes().to_vec(),
            value: id.0.to_be_bytes().to_vec(),
        });
        self.storage.write_batch(ops)?;

        debug!(%id, destination = %metadata.destination, ack = ?ack, "message admitted");
        Ok(id)
    }

    fn delete_from_dead_letter_store(
        &self,
        source: &str,
        records: &[MessageMetadata],
    ) -> StorageResult<()> {
        let mut ops = Vec::new();
        let mut deleted = 0;
        for record in records {
            // Rows are resolved under the source destination's own prefix, so
            // an identifier that is absent or held elsewhere (e.g. live) is
            // skipped. This keeps bulk delete idempotent and confined to the
            // dead-letter store.
            let row_key = keys::message_key(source, record.id);
            if self.storage.get_message(&row_key)?.is_none() {
                continue;
            }
            self.delete_ops_for_row(row_key, record.id, &mut ops)?;
            deleted += 1;
        }
        if !ops.is_empty() {
            self.storage.write_batch(ops)?;
        }
        debug!(%source, requested = records.len(), deleted, "dead-letter store bulk delete");
        Ok(())
    }

    fn create_channel(&self) -> Arc<FlowControlChannel> {
        let channel = Arc::new(FlowControlChannel::new());
        self.channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(Arc::clone(&channel));
        channel
    }

    fn create_destination(
        &self,
        name: &str,
        kind: DestinationKind,
    ) -> Result<DestinationRecord, KernelError> {
        if self.storage.get_destination(name)?.is_some() {
            return Err(KernelError::DestinationAlreadyExists(name.to_string()));
        }
        let record = DestinationRecord {
            name: name.to_string(),
            kind,
            storage_queue: self.storage_queue(name, kind),
            created_at: now_millis(),
        };
        self.storage.put_destination(name, &record)?;
        info!(destination = %name, kind = %kind.as_str(), "destination created");
        Ok(record)
    }

    fn destination(&self, name: &str) -> StorageResult<Option<DestinationRecord>> {
        self.storage.get_destination(name)
    }

    fn delete_destination(&self, name: &str) -> Result<(), KernelError> {
        if self.storage.get_destination(name)?.is_none() {
            return Err(KernelError::DestinationNotFound(name.to_string()));
        }
        let purged = self.purge(name)?;
        self.storage.delete_destination(name)?;
        info!(destination = %name, purged, "destination deleted");
        Ok(())
    }

    fn destinations(&self) -> StorageResult<Vec<DestinationRecord>> {
        self.storage.list_destinations()
    }

    fn messages(&self, destination: &str) -> StorageResult<Vec<MessageMetadata>> {
        let rows = self.storage.list_messages(&keys::message_prefix(destination))?;
        Ok(rows.into_iter().map(|(_, metadata)| metadata).collect())
    }

    fn message(
        &self,
        destination: &str,
        id: MessageId,
    ) -> StorageResult<Option<MessageMetadata>> {
        self.storage.get_message(&keys::message_key(destination, id))
    }

    fn purge(&self, destination: &str) -> StorageResult<u64> {
        let rows = self.storage.list_messages(&keys::message_prefix(destination))?;
        let count = rows.len() as u64;
        let mut ops = Vec::new();
        for (row_key, metadata) in rows {
            self.delete_ops_for_row(row_key, metadata.id, &mut ops)?;
        }
        if !ops.is_empty() {
            self.storage.write_batch(ops)?;
        }
        debug!(%destination, count, "destination purged");
        Ok(count)
    }

    fn message_count(&self, destination: &str) -> StorageResult<u64> {
        self.storage.count_messages(&keys::message_prefix(destination))
    }

    fn subscriptions(&self) -> StorageResult<Vec<SubscriptionRecord>> {
        self.storage.list_subscriptions()
    }

    fn remove_subscription(&self, id: &str) -> Result<(), KernelError> {
        if self.storage.get_subscription(id)?.is_none() {
            return Err(KernelError::SubscriptionNotFound(id.to_string()));
        }
        self.storage.delete_subscription(id)?;
        info!(subscription = %id, "subscription force-closed");
        Ok(())
    }

    fn stored_message_count(&self) -> StorageResult<u64> {
        self.storage.count_messages(b"")
    }
}
