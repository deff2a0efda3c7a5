use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use retoma_core::{
    AckMode, ContentPart, DestinationKind, DestinationRecord, FlowControlChannel, Kernel,
    KernelConfig, KernelError, Message, MessageId, MessageMetadata, NodeKernel, RocksDbStorage,
    Storage, StorageResult, SubscriptionRecord,
};

pub const DLC: &str = "DeadLetterChannel";

pub fn node_kernel() -> (Arc<NodeKernel>, Arc<RocksDbStorage>, tempfile::TempDir) {
    retoma_core::telemetry::init(&retoma_core::TelemetryConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(RocksDbStorage::open(dir.path()).unwrap());
    let kernel = NodeKernel::new(
        Arc::clone(&storage) as Arc<dyn Storage>,
        &KernelConfig::default(),
    )
    .unwrap();
    (Arc::new(kernel), storage, dir)
}

pub fn outbound(destination: &str, payload: &[u8]) -> Message {
    let metadata = MessageMetadata {
        id: MessageId(0),
        destination: destination.to_string(),
        storage_queue: format!("queue:{destination}:node-0"),
        exchange: "amq.direct".to_string(),
        routing_key: destination.to_string(),
        content_length: 0,
        published_at: 1_000,
    };
    Message::new(
        metadata,
        vec![ContentPart {
            index: 0,
            data: payload.to_vec(),
        }],
    )
}

pub fn publish(kernel: &NodeKernel, destination: &str, payload: &[u8]) -> MessageId {
    kernel
        .admit(outbound(destination, payload), AckMode::PublisherAck)
        .unwrap()
}

/// Publish to `destination`, then move the message into the dead-letter store.
pub fn dead_letter(kernel: &NodeKernel, destination: &str, payload: &[u8]) -> MessageId {
    let id = publish(kernel, destination, payload);
    kernel.dead_letter(id, DLC).unwrap();
    id
}

/// Kernel wrapper that engages flow control after a fixed number of
/// admissions, making the mid-batch interruption deterministic.
pub struct BlockingKernel {
    inner: Arc<NodeKernel>,
    channel: Mutex<Option<Arc<FlowControlChannel>>>,
    admissions_left: AtomicUsize,
}

impl BlockingKernel {
    pub fn new(inner: Arc<NodeKernel>, admissions_before_block: usize) -> Self {
        Self {
            inner,
            channel: Mutex::new(None),
            admissions_left: AtomicUsize::new(admissions_before_block),
        }
    }
}

impl Kernel for BlockingKernel {
    fn content(
        &self,
        ids: &[MessageId],
    ) -> StorageResult<HashMap<MessageId, Vec<ContentPart>>> {
        self.inner.content(ids)
    }

    fn metadata(&self, id: MessageId) -> Result<MessageMetadata, KernelError> {
        self.inner.metadata(id)
    }

    fn storage_queue(&self, destination: &str, kind: DestinationKind) -> String {
        self.inner.storage_queue(destination, kind)
    }

    fn admit(&self, message: Message, ack: AckMode) -> StorageResult<MessageId> {
        let id = self.inner.admit(message, ack)?;
        if self.admissions_left.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(channel) = self.channel.lock().unwrap().as_ref() {
                channel.block();
            }
        }
        Ok(id)
    }

    fn delete_from_dead_letter_store(
        &self,
        source: &str,
        records: &[MessageMetadata],
    ) -> StorageResult<()> {
        self.inner.delete_from_dead_letter_store(source, records)
    }

    fn create_channel(&self) -> Arc<FlowControlChannel> {
        let channel = self.inner.create_channel();
        *self.channel.lock().unwrap() = Some(Arc::clone(&channel));
        channel
    }

    fn create_destination(
        &self,
        name: &str,
        kind: DestinationKind,
    ) -> Result<DestinationRecord, KernelError> {
        self.inner.create_destination(name, kind)
    }

    fn destination(&self, name: &str) -> StorageResult<Option<DestinationRecord>> {
        self.inner.destination(name)
    }

    fn delete_destination(&self, name: &str) -> Result<(), KernelError> {
        self.inner.delete_destination(name)
    }

    fn destinations(&self) -> StorageResult<Vec<DestinationRecord>> {
        self.inner.destinations()
    }

    fn messages(&self, destination: &str) -> StorageResult<Vec<MessageMetadata>> {
        self.inner.messages(destination)
    }

    fn message(
        &self,
        destination: &str,
        id: MessageId,
    ) -> StorageResult<Option<MessageMetadata>> {
        self.inner.message(destination, id)
    }

    fn purge(&self, destination: &str) -> StorageResult<u64> {
        self.inner.purge(destination)
    }

    fn message_count(&self, destination: &str) -> StorageResult<u64> {
        self.inner.message_count(destination)
    }

    fn subscriptions(&self) -> StorageResult<Vec<SubscriptionRecord>> {
        self.inner.subscriptions()
    }

    fn remove_subscription(&self, id: &str) -> Result<(), KernelError> {
        self.inner.remove_subscription(id)
    }

    fn stored_message_count(&self) -> StorageResult<u64> {
        self.inner.stored_message_count()
    }
}
