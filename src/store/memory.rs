use crate::core::cache::Cache;
use crate::core::record::{ChangeEvent, ChangeKind, Record, RecordStore, new_record_id};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

pub(crate) const CHANGE_FEED_CAPACITY: usize = 64;

struct CacheValue<V> {
    value: V,
    expires_at: Option<Instant>,
}

/// In-memory cache implementation using a HashMap behind a mutex
pub struct MemoryCache<V> {
    inner: Arc<Mutex<HashMap<String, CacheValue<V>>>>,
}

impl<V> MemoryCache<V> {
    /// Creates a new MemoryCache instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            if let Some(expiry) = entry.expires_at {
                if expiry < Instant::now() {
                    debug!("Cache entry expired for key: {}", key);
                    return None;
                }
            }
            debug!("Cache HIT for key: {}", key);
            return Some(entry.value.clone());
        }
        debug!("Cache MISS for key: {}", key);
        None
    }

    async fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(key.to_string(), CacheValue { value, expires_at });
    }

    async fn remove(&self, key: &str) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {}", key);
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

/// Record collection kept in process memory, ordered by id.
pub struct MemoryRecords<T> {
    inner: Arc<Mutex<BTreeMap<String, T>>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl<T: Record> MemoryRecords<T> {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
            changes,
        }
    }

    fn publish(&self, kind: ChangeKind, id: &str) {
        // No subscribers is not an error
        let _ = self.changes.send(ChangeEvent {
            collection: T::COLLECTION,
            kind,
            id: id.to_string(),
        });
    }
}

impl<T: Record> Default for MemoryRecords<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryRecords<T> {
    async fn list(&self) -> Result<Vec<T>> {
        let records = self.inner.lock().await;
        Ok(records.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        let records = self.inner.lock().await;
        Ok(records.get(id).cloned())
    }

    async fn create(&self, mut record: T) -> Result<T> {
        if record.id().is_empty() {
            record.set_id(new_record_id());
        }
        let id = record.id().to_string();
        {
            let mut records = self.inner.lock().await;
            if records.contains_key(&id) {
                return Err(anyhow!("{} record {} already exists", T::COLLECTION, id));
            }
            records.insert(id.clone(), record.clone());
        }
        debug!(collection = T::COLLECTION, %id, "Record created");
        self.publish(ChangeKind::Insert, &id);
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T> {
        let id = record.id().to_string();
        {
            let mut records = self.inner.lock().await;
            match records.get_mut(&id) {
                Some(existing) => *existing = record.clone(),
                None => return Err(anyhow!("{} record {} not found", T::COLLECTION, id)),
            }
        }
        debug!(collection = T::COLLECTION, %id, "Record updated");
        self.publish(ChangeKind::Update, &id);
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.inner.lock().await.remove(id).is_some();
        if removed {
            debug!(collection = T::COLLECTION, %id, "Record deleted");
            self.publish(ChangeKind::Delete, id);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
