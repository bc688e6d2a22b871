//! Record store abstraction: flat records keyed by a generated id, one
//! collection per entity, each with its own change feed.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::error::ValidationError;

pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Name of the collection the record lives in.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// A record owned by a single trip.
pub trait TripScoped: Record {
    fn trip_id(&self) -> &str;
    fn set_trip_id(&mut self, trip_id: String);

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: &'static str,
    pub kind: ChangeKind,
    pub id: String,
}

#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>>;
    async fn get(&self, id: &str) -> Result<Option<T>>;
    /// Stores a new record, generating its id when it has none.
    async fn create(&self, record: T) -> Result<T>;
    /// Replaces an existing record. Fails when the id is unknown.
    async fn update(&self, record: T) -> Result<T>;
    /// Returns `Ok(false)` when there was nothing to delete.
    async fn delete(&self, id: &str) -> Result<bool>;
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Invokes `on_change` for every change published on `changes` until the
/// store goes away.
pub fn watch<F>(mut changes: broadcast::Receiver<ChangeEvent>, on_change: F) -> JoinHandle<()>
where
    F: Fn(ChangeEvent) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => on_change(event),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Change feed lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
