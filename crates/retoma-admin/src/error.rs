use retoma_core::{KernelError, MessageId, StorageError};

/// Failures of a dead-letter restore batch.
///
/// Every variant is returned, never panicked. `Interrupted` is not a storage
/// failure: the messages counted by `restored` were re-admitted and removed
/// from the dead-letter store before the flow-control stop; the remainder of
/// the batch is untouched and can be retried.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("restore interrupted by flow control after {restored} messages")]
    Interrupted { restored: usize },

    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("missing content for message {0}")]
    MissingContent(MessageId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Kernel(KernelError),
}

impl From<KernelError> for RestoreError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::MessageNotFound(id) => RestoreError::MessageNotFound(id),
            KernelError::Storage(e) => RestoreError::Storage(e),
            other => RestoreError::Kernel(other),
        }
    }
}
