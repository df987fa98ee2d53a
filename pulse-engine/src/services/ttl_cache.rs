//! Time-boxed cache
//!
//! Generic TTL cache for signals that are expensive to refetch. `get`
//! treats expired entries as absent rather than wrong; `put` is a
//! last-writer-wins overwrite, so concurrent refreshes for the same key are
//! harmless. No size-based eviction: the working set is bounded by the
//! venue count.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Cache with a fixed time-to-live per entry
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a fresh entry; expired and missing are both `None`
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if Utc::now().signed_duration_since(entry.fetched_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Insert or overwrite an entry, aged from `fetched_at`
    pub async fn put(&self, key: K, value: V, fetched_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, fetched_at });
    }

    /// Entries currently held, fresh or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
