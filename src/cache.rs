//! A size-bounded LRU with a per-entry TTL.
//!
//! Backs both the OAuth token cache (§4.5) and the AWS Secrets Manager
//! per-request secret cache (§4.7). Expired and capacity-evicted entries
//! are indistinguishable from a plain miss; there is no negative caching
//! of failures and no single-flight guard — two concurrent misses for the
//! same key may both perform the full fetch and both `put` (§5).

use crate::clock::{Clock, SystemClock};
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe, size-bounded, per-entry-TTL cache.
pub struct TtlLru<K, V> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlLru<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    /// Returns `Some(value)` on a live hit. Consults `monotonic_now()`
    /// against the entry's insertion instant, not `Clock::now_unix()`, so
    /// a `FixedClock` used for JWT `iat`/`exp` testing does not also
    /// freeze cache expiry.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().unwrap();
        let expired = match guard.get(key) {
            Some(entry) => self.clock.monotonic_now().duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };
        if expired {
            guard.pop(key);
            None
        } else {
            guard.get(key).map(|e| e.value.clone())
        }
    }

    pub fn put(&self, key: K, value: V) {
        let mut guard = self.inner.lock().unwrap();
        guard.put(
            key,
            Entry {
                value,
                inserted_at: self.clock.monotonic_now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
