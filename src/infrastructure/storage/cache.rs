// In-memory response cache with TTL and insertion-order eviction
use crate::domain::model::{Fingerprint, Response};
use crate::infrastructure::config::CacheConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Response,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<Fingerprint, CacheEntry>,
    // Insertion order; the front is evicted first.
    order: VecDeque<Fingerprint>,
}

/// Thread-safe bounded response cache
///
/// Expiry is checked lazily on read, so a stale entry keeps its slot until it
/// is overwritten or evicted. When full, the entry inserted earliest is
/// evicted regardless of how recently it was read (FIFO, not LRU).
#[derive(Debug)]
pub struct ResponseCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn get(&self, key: &Fingerprint) -> Option<Response> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = inner.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn set(&self, key: Fingerprint, value: Response) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let stored_at = Instant::now();

        // Overwrites keep their original insertion position.
        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.stored_at = stored_at;
            return;
        }

        if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                tracing::trace!(key = oldest.short(), "evicted oldest cache entry");
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, CacheEntry { value, stored_at });

        debug_assert!(inner.entries.len() <= self.capacity);
        debug_assert_eq!(inner.entries.len(), inner.order.len());
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of occupied slots, expired entries included.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
