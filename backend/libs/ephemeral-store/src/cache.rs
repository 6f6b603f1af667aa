//! TTL caching with lazy eviction.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CacheSlot<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory cache mapping string keys to values with an absolute expiry.
///
/// A read past the expiry is treated as absent and evicts the entry; there
/// is no background sweeper.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheSlot<V>>>,
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, expiring `ttl` from now. An existing entry
    /// is replaced.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let slot = CacheSlot {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.into(), slot);
    }

    /// Drop one entry, returning its value if it was still live.
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let slot = entries.remove(key)?;
        (Instant::now() < slot.expires_at).then_some(slot.value)
    }

    /// Empty the entire store.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of entries currently held, expired-but-unevicted included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Fetch the value under `key` unless its expiry has passed, in which
    /// case the entry is evicted and `None` is returned.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(slot) if Instant::now() < slot.expires_at => {
                debug!(key = %key, "cache hit");
                return Some(slot.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
            debug!(key = %key, "cache entry expired");
        }
        None
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
