use std::sync::Arc;

use tracing::debug;

use retoma_core::{
    DestinationKind, DestinationRecord, Kernel, KernelConfig, KernelError, MessageId,
    MessageMetadata, Protocol, StorageResult, SubscriptionRecord,
};

use crate::error::RestoreError;
use crate::restore::RestoreEngine;

mod amqp;
mod mqtt;

pub use amqp::AmqpQueueResource;
pub use mqtt::MqttTopicResource;

/// One message as seen by the browse operations. Content is only attached
/// when the caller asked for it.
#[derive(Debug, Clone)]
pub struct BrowsedMessage {
    pub metadata: MessageMetadata,
    pub content: Option<Vec<retoma_core::ContentPart>>,
}

/// Filter for subscription listing. `name` is a keyword (substring, `"*"` or
/// empty matches all); `destination` is an exact match when set.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionQuery<'a> {
    pub name: &'a str,
    pub destination: Option<&'a str>,
    pub active: Option<bool>,
    pub offset: usize,
    pub limit: usize,
}

fn keyword_matches(keyword: &str, name: &str) -> bool {
    keyword.is_empty() || keyword == "*" || name.contains(keyword)
}

/// Shared implementation behind the per-protocol facade variants. Owns the
/// restore engine and, through it, one registered flow-control channel.
pub struct FacadeCore {
    kernel: Arc<dyn Kernel>,
    engine: RestoreEngine,
    dead_letter_destination: String,
}

impl FacadeCore {
    pub fn new(kernel: Arc<dyn Kernel>, config: &KernelConfig) -> Self {
        let engine = RestoreEngine::new(Arc::clone(&kernel));
        Self {
            kernel,
            engine,
            dead_letter_destination: config.dead_letter_destination.clone(),
        }
    }

    pub fn dead_letter_destination(&self) -> &str {
        &self.dead_letter_destination
    }

    fn create_destination(
        &self,
        name: &str,
        kind: DestinationKind,
    ) -> Result<DestinationRecord, KernelError> {
        self.kernel.create_destination(name, kind)
    }

    fn destination(
        &self,
        name: &str,
        kind: DestinationKind,
    ) -> Result<Option<DestinationRecord>, KernelError> {
        Ok(self.kernel.destination(name)?.filter(|r| r.kind == kind))
    }

    fn delete_destination(&self, name: &str, kind: DestinationKind) -> Result<(), KernelError> {
        match self.kernel.destination(name)? {
            Some(record) if record.kind == kind => self.kernel.delete_destination(name),
            _ => Err(KernelError::DestinationNotFound(name.to_string())),
        }
    }

    fn destinations(
        &self,
        kind: DestinationKind,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DestinationRecord>, KernelError> {
        Ok(self
            .kernel
            .destinations()?
            .into_iter()
            .filter(|r| r.kind == kind && keyword_matches(keyword, &r.name))
            .skip(offset)
            .take(limit)
            .collect())
    }

    fn attach_content(
        &self,
        records: Vec<MessageMetadata>,
        include_content: bool,
    ) -> Result<Vec<BrowsedMessage>, KernelError> {
        if !include_content {
            return Ok(records
                .into_iter()
                .map(|metadata| BrowsedMessage {
                    metadata,
                    content: None,
                })
                .collect());
        }
        let ids: Vec<MessageId> = records.iter().map(|m| m.id).collect();
        let mut contents = self.kernel.content(&ids)?;
        Ok(records
            .into_iter()
            .map(|metadata| {
                let content = contents.remove(&metadata.id);
                BrowsedMessage { metadata, content }
            })
            .collect())
    }

    fn browse_from(
        &self,
        destination: &str,
        first: MessageId,
        limit: usize,
        include_content: bool,
    ) -> Result<Vec<BrowsedMessage>, KernelError> {
        let records: Vec<MessageMetadata> = self
            .kernel
            .messages(destination)?
            .into_iter()
            .filter(|m| m.id >= first)
            .take(limit)
            .collect();
        self.attach_content(records, include_content)
    }

    // Offset browse walks the whole destination prefix up to offset + limit.
    fn browse_at(
        &self,
        destination: &str,
        offset: usize,
        limit: usize,
        include_content: bool,
    ) -> Result<Vec<BrowsedMessage>, KernelError> {
        let records: Vec<MessageMetadata> = self
            .kernel
            .messages(destination)?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();
        self.attach_content(records, include_content)
    }

    fn message(
        &self,
        destination: &str,
        id: MessageId,
        include_content: bool,
    ) -> Result<Option<BrowsedMessage>, KernelError> {
        match self.kernel.message(destination, id)? {
            Some(metadata) => Ok(self.attach_content(vec![metadata], include_content)?.pop()),
            None => Ok(None),
        }
    }

    fn message_count(&self, destination: &str) -> Result<u64, KernelError> {
        Ok(self.kernel.message_count(destination)?)
    }

    fn purge(&self, destination: &str) -> Result<u64, KernelError> {
        Ok(self.kernel.purge(destination)?)
    }

    fn subscriptions(
        &self,
        protocol: Protocol,
        query: &SubscriptionQuery<'_>,
    ) -> Result<Vec<SubscriptionRecord>, KernelError> {
        Ok(self
            .kernel
            .subscriptions()?
            .into_iter()
            .filter(|s| {
                s.protocol == protocol
                    && keyword_matches(query.name, &s.name)
                    && query.destination.map_or(true, |d| s.destination == d)
                    && query.active.map_or(true, |a| s.active == a)
            })
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    fn close_subscription(&self, id: &str) -> Result<(), KernelError> {
        self.kernel.remove_subscription(id)
    }

    fn close_subscriptions_for(
        &self,
        protocol: Protocol,
        destination: &str,
    ) -> Result<usize, KernelError> {
        let doomed: Vec<String> = self
            .kernel
            .subscriptions()?
            .into_iter()
            .filter(|s| s.protocol == protocol && s.destination == destination)
            .map(|s| s.id)
            .collect();
        for id in &doomed {
            self.kernel.remove_subscription(id)?;
        }
        debug!(%destination, closed = doomed.len(), "subscriptions force-closed");
        Ok(doomed.len())
    }

    fn restore_dead_letters(&self, ids: &[MessageId]) -> Result<usize, RestoreError> {
        self.engine
            .restore_batch(ids, &self.dead_letter_destination, None)
    }

    fn reroute_dead_letters(
        &self,
        ids: &[MessageId],
        new_destination: &str,
    ) -> Result<usize, RestoreError> {
        self.engine
            .restore_batch(ids, &self.dead_letter_destination, Some(new_destination))
    }

    fn delete_dead_letters(&self, ids: &[MessageId]) -> StorageResult<()> {
        self.engine.delete_batch(ids, &self.dead_letter_destination)
    }
}

/// Administrative capability set, partitioned per protocol. Each variant sees
/// only destinations of its kind and subscriptions of its protocol; the
/// dead-letter operations are shared.
pub trait ResourceFacade {
    fn core(&self) -> &FacadeCore;
    fn protocol(&self) -> Protocol;
    fn kind(&self) -> DestinationKind;

    fn create_destination(&self, name: &str) -> Result<DestinationRecord, KernelError> {
        self.core().create_destination(name, self.kind())
    }

    fn destination(&self, name: &str) -> Result<Option<DestinationRecord>, KernelError> {
        self.core().destination(name, self.kind())
    }

    fn delete_destination(&self, name: &str) -> Result<(), KernelError> {
        self.core().delete_destination(name, self.kind())
    }

    /// Keyword substring filter (`"*"` or empty matches all) with
    /// offset/limit pagination.
    fn destinations(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DestinationRecord>, KernelError> {
        self.core().destinations(self.kind(), keyword, offset, limit)
    }

    /// Browse by identifier cursor: messages with `id >= first`, up to
    /// `limit`, in identifier order.
    fn browse_from(
        &self,
        destination: &str,
        first: MessageId,
        limit: usize,
        include_content: bool,
    ) -> Result<Vec<BrowsedMessage>, KernelError> {
        self.core()
            .browse_from(destination, first, limit, include_content)
    }

    /// Browse by position offset.
    fn browse_at(
        &self,
        destination: &str,
        offset: usize,
        limit: usize,
        include_content: bool,
    ) -> Result<Vec<BrowsedMessage>, KernelError> {
        self.core()
            .browse_at(destination, offset, limit, include_content)
    }

    fn message(
        &self,
        destination: &str,
        id: MessageId,
        include_content: bool,
    ) -> Result<Option<BrowsedMessage>, KernelError> {
        self.core().message(destination, id, include_content)
    }

    fn message_count(&self, destination: &str) -> Result<u64, KernelError> {
        self.core().message_count(destination)
    }

    /// Drop every message held by a destination. Returns the purged count.
    fn purge(&self, destination: &str) -> Result<u64, KernelError> {
        self.core().purge(destination)
    }

    fn subscriptions(
        &self,
        query: &SubscriptionQuery<'_>,
    ) -> Result<Vec<SubscriptionRecord>, KernelError> {
        self.core().subscriptions(self.protocol(), query)
    }

    fn close_subscription(&self, id: &str) -> Result<(), KernelError> {
        self.core().close_subscription(id)
    }

    /// Force-close every subscription of this protocol on a destination.
    fn close_subscriptions_for(&self, destination: &str) -> Result<usize, KernelError> {
        self.core()
            .close_subscriptions_for(self.protocol(), destination)
    }

    /// Restore dead-lettered messages to their original destinations.
    fn restore_dead_letters(&self, ids: &[MessageId]) -> Result<usize, RestoreError> {
        self.core().restore_dead_letters(ids)
    }

    /// Restore dead-lettered messages, rerouting the whole batch.
    fn reroute_dead_letters(
        &self,
        ids: &[MessageId],
        new_destination: &str,
    ) -> Result<usize, RestoreError> {
        self.core().reroute_dead_letters(ids, new_destination)
    }

    /// Drop dead-lettered messages without restoring them.
    fn delete_dead_letters(&self, ids: &[MessageId]) -> StorageResult<()> {
        self.core().delete_dead_letters(ids)
    }
}
