use crate::core::cache::Cache;
use crate::core::record::{ChangeEvent, ChangeKind, Record, RecordStore, new_record_id};
use crate::store::memory::CHANGE_FEED_CAPACITY;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache persisted in a fjall partition, values stored as JSON.
pub struct DiskCache<V> {
    partition: PartitionHandle,
    _marker: PhantomData<V>,
}

impl<V> DiskCache<V> {
    pub fn new(partition: PartitionHandle) -> Self {
        Self {
            partition,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<V> Cache<V> for DiskCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let res: Result<Option<V>> = (|| {
            if let Some(value) = self.partition.get(key)? {
                let entry: CacheEntry<V> = serde_json::from_slice(&value)?;
                if let Some(expires_at) = entry.expires_at {
                    if SystemTime::now() > expires_at {
                        debug!("Cache entry expired for key: {}", key);
                        self.partition.remove(key)?;
                        return Ok(None);
                    }
                }
                debug!("Cache HIT for key: {}", key);
                return Ok(Some(entry.value));
            }
            debug!("Cache MISS for key: {}", key);
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskCache get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let expires_at = ttl.map(|d| SystemTime::now() + d);
            let entry = CacheEntry { value, expires_at };
            self.partition.insert(key, serde_json::to_vec(&entry)?)?;
            debug!("Cache PUT for key: {}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCache put error: {}", e);
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.partition.remove(key) {
            debug!("DiskCache remove error: {}", e);
        }
    }

    async fn clear(&self) {
        let keys: Vec<_> = self
            .partition
            .keys()
            .filter_map(|key| key.ok())
            .collect();
        for key in keys {
            if let Err(e) = self.partition.remove(key) {
                debug!("DiskCache clear error: {}", e);
            }
        }
    }
}

/// Record collection persisted in its own fjall partition.
pub struct DiskRecords<T> {
    partition: PartitionHandle,
    changes: broadcast::Sender<ChangeEvent>,
    _marker: PhantomData<T>,
}

impl<T: Record> DiskRecords<T> {
    pub fn new(partition: PartitionHandle) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            partition,
            changes,
            _marker: PhantomData,
        }
    }

    fn publish(&self, kind: ChangeKind, id: &str) {
        let _ = self.changes.send(ChangeEvent {
            collection: T::COLLECTION,
            kind,
            id: id.to_string(),
        });
    }

    fn write(&self, record: &T) -> Result<()> {
        self.partition
            .insert(record.id(), serde_json::to_vec(record)?)?;
        Ok(())
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for DiskRecords<T> {
    async fn list(&self) -> Result<Vec<T>> {
        self.partition
            .iter()
            .map(|kv| -> Result<T> {
                let (_, value) = kv?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        match self.partition.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, mut record: T) -> Result<T> {
        if record.id().is_empty() {
            record.set_id(new_record_id());
        }
        if self.partition.contains_key(record.id())? {
            return Err(anyhow!(
                "{} record {} already exists",
                T::COLLECTION,
                record.id()
            ));
        }
        self.write(&record)?;
        debug!(collection = T::COLLECTION, id = record.id(), "Record created");
        self.publish(ChangeKind::Insert, record.id());
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T> {
        if !self.partition.contains_key(record.id())? {
            return Err(anyhow!(
                "{} record {} not found",
                T::COLLECTION,
                record.id()
            ));
        }
        self.write(&record)?;
        debug!(collection = T::COLLECTION, id = record.id(), "Record updated");
        self.publish(ChangeKind::Update, record.id());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if !self.partition.contains_key(id)? {
            return Ok(false);
        }
        self.partition.remove(id)?;
        debug!(collection = T::COLLECTION, %id, "Record deleted");
        self.publish(ChangeKind::Delete, id);
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
