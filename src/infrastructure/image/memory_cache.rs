//! Bounded in-memory cache of loaded images.
//!
//! The default policy is insertion-order (FIFO) eviction: reads never
//! protect an entry, and re-setting a key keeps its original position.
//! [`EvictionPolicy::Lru`] promotes entries on read instead.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::entities::CacheEntry;
use crate::domain::ports::ImageCachePort;

/// Default maximum number of entries.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// How entries are chosen for eviction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Oldest insertion goes first.
    #[default]
    Fifo,
    /// Least recently read goes first.
    Lru,
}

/// In-memory image cache keyed by resolved URL.
pub struct MemoryImageCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    policy: EvictionPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemoryImageCache {
    /// Creates a cache with the given capacity and policy.
    #[must_use]
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a FIFO cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE, EvictionPolicy::Fifo)
    }

    /// Returns the eviction policy.
    #[must_use]
    pub const fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Returns the keys from next-to-evict to most recent.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.cache.lock().iter().rev().map(|(k, _)| k.clone()).collect()
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached entries.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

impl ImageCachePort for MemoryImageCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut cache = self.cache.lock();
        let found = match self.policy {
            EvictionPolicy::Fifo => cache.peek(key).cloned(),
            EvictionPolicy::Lru => cache.get(key).cloned(),
        };
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Image cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Image cache miss");
        }
        found
    }

    fn set(&self, key: String, entry: CacheEntry) {
        let mut cache = self.cache.lock();
        if self.policy == EvictionPolicy::Fifo {
            if let Some(existing) = cache.peek_mut(&key) {
                *existing = entry;
                return;
            }
        }
        if let Some((evicted, _)) = cache.push(key.clone(), entry) {
            if evicted != key {
                debug!(evicted = %evicted, "Evicted image from memory cache");
            }
        }
    }

    fn has(&self, key: &str) -> bool {
        self.cache.lock().contains(key)
    }

    fn len(&self) -> usize {
        self.cache.lock().len()
    }

    fn clear(&self) {
        self.cache.lock().clear();
        debug!("Cleared memory image cache");
    }
}
