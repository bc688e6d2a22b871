//! Key-value cache abstraction shared by the rate cache and session state.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// A string-keyed cache with optional per-entry expiry.
///
/// Implementations never fail loudly: backend errors are logged and turn
/// into misses, so callers can always fall back to a fresh value.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V>;
    async fn put(&self, key: &str, value: V, ttl: Option<Duration>);
    async fn remove(&self, key: &str);
    async fn clear(&self);
}
