pub mod disk;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::record::{Record, RecordStore};
use anyhow::{Context, Result, anyhow};
use disk::{DiskCache, DiskRecords};
use fjall::{Keyspace, PartitionCreateOptions, PersistMode};
use memory::{MemoryCache, MemoryRecords};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    any::Any,
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::debug;

const CACHE_PARTITION_PREFIX: &str = "cache_";

/// Hands out record collections and caches, either persisted in a fjall
/// keyspace or kept in memory.
///
/// Collections are created once and shared, so every caller of the same
/// collection sees the same change feed.
pub struct Store {
    collections: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    keyspace: Option<Keyspace>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        debug!(path = %path.display(), "Opened persistent store");
        Ok(Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: Some(keyspace),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    /// Flushes the journal to disk. A no-op for the in-memory store.
    pub fn persist(&self) -> Result<()> {
        if let Some(keyspace) = &self.keyspace {
            keyspace
                .persist(PersistMode::SyncAll)
                .context("Failed to persist store")?;
            debug!("Store persisted");
        }
        Ok(())
    }

    pub fn records<T: Record>(&self) -> Result<Arc<dyn RecordStore<T>>> {
        let collection = self.collection(T::COLLECTION, |keyspace| match keyspace {
            Some(ks) => {
                let partition = ks.open_partition(T::COLLECTION, PartitionCreateOptions::default())?;
                Ok(Arc::new(DiskRecords::<T>::new(partition)) as Arc<dyn Any + Send + Sync>)
            }
            None => Ok(Arc::new(MemoryRecords::<T>::new()) as Arc<dyn Any + Send + Sync>),
        })?;

        if self.is_persistent() {
            downcast::<DiskRecords<T>>(collection).map(|c| c as Arc<dyn RecordStore<T>>)
        } else {
            downcast::<MemoryRecords<T>>(collection).map(|c| c as Arc<dyn RecordStore<T>>)
        }
    }

    pub fn cache<V>(&self, name: &str) -> Result<Arc<dyn Cache<V>>>
    where
        V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    {
        let partition_name = format!("{CACHE_PARTITION_PREFIX}{name}");
        let collection = self.collection(&partition_name, |keyspace| match keyspace {
            Some(ks) => {
                let partition = ks.open_partition(&partition_name, PartitionCreateOptions::default())?;
                Ok(Arc::new(DiskCache::<V>::new(partition)) as Arc<dyn Any + Send + Sync>)
            }
            None => Ok(Arc::new(MemoryCache::<V>::new()) as Arc<dyn Any + Send + Sync>),
        })?;

        if self.is_persistent() {
            downcast::<DiskCache<V>>(collection).map(|c| c as Arc<dyn Cache<V>>)
        } else {
            downcast::<MemoryCache<V>>(collection).map(|c| c as Arc<dyn Cache<V>>)
        }
    }

    fn collection<F>(&self, name: &str, create: F) -> Result<Arc<dyn Any + Send + Sync>>
    where
        F: FnOnce(Option<&Keyspace>) -> Result<Arc<dyn Any + Send + Sync>>,
    {
        if let Some(existing) = self
            .collections
            .read()
            .map_err(|_| anyhow!("Store registry lock poisoned"))?
            .get(name)
        {
            return Ok(Arc::clone(existing));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("Store registry lock poisoned"))?;
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }
        let created = create(self.keyspace.as_ref())
            .with_context(|| format!("Failed to open collection {name}"))?;
        debug!(collection = name, "Opened collection");
        collections.insert(name.to_string(), Arc::clone(&created));
        Ok(created)
    }
}

fn downcast<C: Any + Send + Sync>(collection: Arc<dyn Any + Send + Sync>) -> Result<Arc<C>> {
    collection
        .downcast::<C>()
        .map_err(|_| anyhow!("Collection was opened with a different type"))
}
