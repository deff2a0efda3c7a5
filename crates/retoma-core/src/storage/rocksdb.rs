use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::destination::DestinationRecord;
use crate::error::{StorageError, StorageResult};
use crate::message::MessageMetadata;
use crate::storage::traits::{Storage, WriteBatchOp};
use crate::subscription::SubscriptionRecord;

const CF_MESSAGES: &str = "messages";
const CF_CONTENT: &str = "content";
const CF_ID_INDEX: &str = "id_index";
const CF_DESTINATIONS: &str = "destinations";
const CF_SUBSCRIPTIONS: &str = "subscriptions";
const CF_STATE: &str = "state";

/// All column family names (excluding `default` which RocksDB creates automatically).
const COLUMN_FAMILIES: &[&str] = &[
    CF_MESSAGES,
    CF_CONTENT,
    CF_ID_INDEX,
    CF_DESTINATIONS,
    CF_SUBSCRIPTIONS,
    CF_STATE,
];

type DB = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed storage implementation.
pub struct RocksDbStorage {
    db: DB,
}

impl RocksDbStorage {
    /// Open or create a RocksDB database at the given path with all column families.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> StorageResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::RocksDb(format!("column family not found: {name}")))
    }

    fn list_prefix(&self, cf_name: &str, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));
        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

impl Storage for RocksDbStorage {
    fn put_message(&self, key: &[u8], metadata: &MessageMetadata) -> StorageResult<()> {
        let cf = self.cf(CF_MESSAGES)?;
        let value = serde_json::to_vec(metadata)?;
        self.db.put_cf(&cf, key, &value)?;
        Ok(())
    }

    fn get_message(&self, key: &[u8]) -> StorageResult<Option<MessageMetadata>> {
        let cf = self.cf(CF_MESSAGES)?;
        match self.db.get_cf(&cf, key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn list_messages(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, MessageMetadata)>> {
        self.list_prefix(CF_MESSAGES, prefix)?
            .into_iter()
            .map(|(key, value)| {
                let metadata: MessageMetadata = serde_json::from_slice(&value)?;
                Ok((key, metadata))
            })
            .collect()
    }

    fn count_messages(&self, prefix: &[u8]) -> StorageResult<u64> {
        let cf = self.cf(CF_MESSAGES)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));
        let mut count = 0;
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn put_content(&self, key: &[u8], data: &[u8]) -> StorageResult<()> {
        let cf = self.cf(CF_CONTENT)?;
        self.db.put_cf(&cf, key, data)?;
        Ok(())
    }

    fn list_content(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.list_prefix(CF_CONTENT, prefix)
    }

    fn put_index(&self, key: &[u8], row_key: &[u8]) -> StorageResult<()> {
        let cf = self.cf(CF_ID_INDEX)?;
        self.db.put_cf(&cf, key, row_key)?;
        Ok(())
    }

    fn get_index(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let cf = self.cf(CF_ID_INDEX)?;
        Ok(self.db.get_cf(&cf, key)?.map(|v| v.to_vec()))
    }

    fn put_destination(&self, name: &str, record: &DestinationRecord) -> StorageResult<()> {
        let cf = self.cf(CF_DESTINATIONS)?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, name.as_bytes(), &value)?;
        Ok(())
    }

    fn get_destination(&self, name: &str) -> StorageResult<Option<DestinationRecord>> {
        let cf = self.cf(CF_DESTINATIONS)?;
        match self.db.get_cf(&cf, name.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn delete_destination(&self, name: &str) -> StorageResult<()> {
        let cf = self.cf(CF_DESTINATIONS)?;
        self.db.delete_cf(&cf, name.as_bytes())?;
        Ok(())
    }

    fn list_destinations(&self) -> StorageResult<Vec<DestinationRecord>> {
        let cf = self.cf(CF_DESTINATIONS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut results = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let record: DestinationRecord = serde_json::from_slice(&value)?;
            results.push(record);
        }
        Ok(results)
    }

    fn put_subscription(&self, id: &str, record: &SubscriptionRecord) -> StorageResult<()> {
        let cf = self.cf(CF_SUBSCRIPTIONS)?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, id.as_bytes(), &value)?;
        Ok(())
    }

    fn get_subscription(&self, id: &str) -> StorageResult<Option<SubscriptionRecord>> {
        let cf = self.cf(CF_SUBSCRIPTIONS)?;
        match self.db.get_cf(&cf, id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn delete_subscription(&self, id: &str) -> StorageResult<()> {
        let cf = self.cf(CF_SUBSCRIPTIONS)?;
        self.db.delete_cf(&cf, id.as_bytes())?;
        Ok(())
    }

    fn list_subscriptions(&self) -> StorageResult<Vec<SubscriptionRecord>> {
        let cf = self.cf(CF_SUBSCRIPTIONS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut results = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let record: SubscriptionRecord = serde_json::from_slice(&value)?;
            results.push(record);
        }
        Ok(results)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let cf = self.cf(CF_STATE)?;
        self.db.put_cf(&cf, key.as_bytes(), value)?;
        Ok(())
    }

    fn get_state(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let cf = self.cf(CF_STATE)?;
        Ok(self.db.get_cf(&cf, key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn write_batch(&self, ops: Vec<WriteBatchOp>) -> StorageResult<()> {
        let mut batch = WriteBatch::default();

        for op in ops {
            match op {
                WriteBatchOp::PutMessage { key, value } => {
                    batch.put_cf(&self.cf(CF_MESSAGES)?, &key, &value);
                }
                WriteBatchOp::DeleteMessage { key } => {
                    batch.delete_cf(&self.cf(CF_MESSAGES)?, &key);
                }
                WriteBatchOp::PutContent { key, value } => {
                    batch.put_cf(&self.cf(CF_CONTENT)?, &key, &value);
                }
                WriteBatchOp::DeleteContent { key } => {
                    batch.delete_cf(&self.cf(CF_CONTENT)?, &key);
                }
                WriteBatchOp::PutIndex { key, value } => {
                    batch.put_cf(&self.cf(CF_ID_INDEX)?, &key, &value);
                }
                WriteBatchOp::DeleteIndex { key } => {
                    batch.delete_cf(&self.cf(CF_ID_INDEX)?, &key);
                }
                WriteBatchOp::PutState { key, value } => {
                    batch.put_cf(&self.cf(CF_STATE)?, &key, &value);
                }
            }
        }

        self.db.write(batch)?;
        Ok(())
    }
}
