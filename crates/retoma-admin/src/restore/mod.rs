use std::sync::Arc;

use tracing::{debug, info, warn};

use retoma_core::{
    AckMode, DestinationKind, FlowControlChannel, FlowState, Kernel, Message, MessageId,
    MessageMetadata, StorageResult,
};

use crate::error::RestoreError;

#[cfg(test)]
mod tests;

/// Exchange stamped onto a message when it is rerouted to a different
/// destination during restore.
pub(crate) const DIRECT_EXCHANGE: &str = "amq.direct";

/// Dead-Letter Restore Engine.
///
/// Moves dead-lettered messages back into live queues in batches, stopping
/// cooperatively when the kernel engages flow control. The engine never holds
/// locks across iterations; the only cross-thread state is the flow-control
/// channel it registered at construction.
pub struct RestoreEngine {
    kernel: Arc<dyn Kernel>,
    channel: Arc<FlowControlChannel>,
}

impl RestoreEngine {
    pub fn new(kernel: Arc<dyn Kernel>) -> Self {
        let channel = kernel.create_channel();
        Self { kernel, channel }
    }

    /// Bulk-remove dead-lettered messages without restoring them.
    ///
    /// Builds minimal metadata stubs carrying only the identifier and the
    /// source destination; identifiers already gone from the dead-letter
    /// store, or held by some other destination, are skipped. No flow-control
    /// check: deletion only shrinks the store.
    pub fn delete_batch(&self, ids: &[MessageId], source: &str) -> StorageResult<()> {
        let stubs: Vec<MessageMetadata> = ids
            .iter()
            .map(|&id| MessageMetadata {
                id,
                destination: source.to_string(),
                storage_queue: source.to_string(),
                exchange: String::new(),
                routing_key: String::new(),
                content_length: 0,
                published_at: 0,
            })
            .collect();
        self.kernel.delete_from_dead_letter_store(source, &stubs)?;
        info!(count = ids.len(), %source, "dead-letter batch deleted");
        Ok(())
    }

    /// Restore a batch of dead-lettered messages.
    ///
    /// With `new_destination = None` each message returns to the destination
    /// recorded in its metadata; with `Some(target)` the whole batch is
    /// rerouted there. Returns the number of messages restored.
    ///
    /// Each iteration re-checks the flow-control snapshot before admitting.
    /// On a Blocked snapshot the remainder of the batch is left untouched in
    /// the dead-letter store and `Interrupted { restored }` reports how many
    /// messages made it through. Whatever ends the loop, the trailing bulk
    /// delete removes exactly the successfully re-admitted prefix, so a
    /// message is never both live and dead-lettered, and never lost.
    pub fn restore_batch(
        &self,
        ids: &[MessageId],
        source: &str,
        new_destination: Option<&str>,
    ) -> Result<usize, RestoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // One bulk content fetch up front; per-message metadata lookups
        // happen inside the loop so an interrupt skips them entirely.
        let contents = self.kernel.content(ids)?;

        let mut to_delete: Vec<MessageMetadata> = Vec::with_capacity(ids.len());
        let mut failure: Option<RestoreError> = None;

        for &id in ids {
            if self.channel.snapshot() == FlowState::Blocked {
                warn!(%id, restored = to_delete.len(), %source, "restore interrupted by flow control");
                failure = Some(RestoreError::Interrupted {
                    restored: to_delete.len(),
                });
                break;
            }

            let original = match self.kernel.metadata(id) {
                Ok(metadata) => metadata,
                Err(err) => {
                    failure = Some(err.into());
                    break;
                }
            };
            let parts = match contents.get(&id) {
                Some(parts) => parts.clone(),
                None => {
                    failure = Some(RestoreError::MissingContent(id));
                    break;
                }
            };

            let mut outbound = original.clone();
            if let Some(target) = new_destination {
                outbound.destination = target.to_string();
                outbound.routing_key = target.to_string();
                outbound.exchange = DIRECT_EXCHANGE.to_string();
            }
            // Recomputed even when returning home: the physical queue is
            // node-local and may differ from where the message was
            // dead-lettered.
            outbound.storage_queue = self
                .kernel
                .storage_queue(&outbound.destination, DestinationKind::Queue);

            match self.kernel.admit(Message::new(outbound, parts), AckMode::Suppressed) {
                Ok(new_id) => {
                    debug!(old = %id, new = %new_id, "dead-lettered message re-admitted");
                    // Appended only after a successful admission: the deleted
                    // set must be exactly the re-admitted prefix.
                    to_delete.push(original);
                }
                Err(err) => {
                    failure = Some(err.into());
                    break;
                }
            }
        }

        let restored = to_delete.len();
        if let Err(err) = self.kernel.delete_from_dead_letter_store(source, &to_delete) {
            // A pending loop failure outranks the cleanup failure.
            return Err(failure.unwrap_or(RestoreError::Storage(err)));
        }

        match failure {
            Some(err) => Err(err),
            None => {
                info!(
                    restored,
                    %source,
                    rerouted = new_destination.is_some(),
                    "dead-letter batch restored"
                );
                Ok(restored)
            }
        }
    }
}
