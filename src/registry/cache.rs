//! Time-boxed cache for catalog resources with stale fallback.

use crate::error::{ApiError, TransportError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Cache keyed by logical resource name (`index`, `category:<name>`).
///
/// A failed refresh serves the last known value, however old, before giving up.
pub struct ResourceCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResourceCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Value for `key` if it was fetched within the TTL.
    pub fn fresh(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Value for `key` regardless of age.
    pub fn stale(&self, key: &str) -> Option<V> {
        self.entries.lock().get(key).map(|entry| entry.value.clone())
    }

    pub fn store(&self, key: &str, value: V) {
        self.entries.lock().insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Return the fresh value, or fetch and store a new one.
    ///
    /// On fetch failure the stale value is returned when one exists; otherwise
    /// the failure becomes [`ApiError::RegistryUnavailable`].
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, TransportError>>,
    {
        if let Some(value) = self.fresh(key) {
            tracing::debug!(resource = key, "Catalog cache hit");
            return Ok(value);
        }

        match fetch().await {
            Ok(value) => {
                self.store(key, value.clone());
                Ok(value)
            }
            Err(err) => match self.stale(key) {
                Some(value) => {
                    tracing::warn!(
                        resource = key,
                        error = %err,
                        "Registry fetch failed, serving stale cached value"
                    );
                    Ok(value)
                }
                None => Err(ApiError::RegistryUnavailable(err.to_string())),
            },
        }
    }
}
