use crate::message::MessageId;

/// Low-level storage errors (RocksDB, serialization).
/// This is the error type for the `Storage` trait; storage operations can only
/// fail with infrastructure errors, never domain errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("rocksdb error: {0}")]
    RocksDb(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),
}

impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        StorageError::RocksDb(err.into_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the broker-kernel boundary.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    #[error("destination already exists: {0}")]
    DestinationAlreadyExists(String),

    #[error("subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the resource monitor lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("failed to spawn resource monitor thread: {0}")]
    Spawn(String),
}

/// Errors while loading or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
