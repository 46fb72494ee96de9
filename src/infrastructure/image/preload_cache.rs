//! In-memory FIFO record of rendered image URLs that finished loading.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::ports::PreloadCachePort;

/// Default maximum number of remembered URLs.
pub const DEFAULT_MAX_LOADED_CACHE: usize = 500;

#[derive(Debug, Default)]
struct FifoSet {
    members: HashSet<String>,
    order: VecDeque<String>,
}

/// Bounded set of loaded URLs.
///
/// Eviction is first-in first-out: a lookup or a repeated insert never
/// refreshes an entry's position.
pub struct MediaPreloadCache {
    inner: Mutex<FifoSet>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MediaPreloadCache {
    /// Creates a cache holding at most `capacity` URLs.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(FifoSet::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MAX_LOADED_CACHE)
    }

    /// Maximum number of remembered URLs.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
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

impl Default for MediaPreloadCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Statistics about cache lookups.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of lookups that found the URL.
    pub hits: u64,
    /// Number of lookups that did not.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of remembered URLs.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Preload cache: {} urls, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

impl PreloadCachePort for MediaPreloadCache {
    fn has(&self, url: &str) -> bool {
        let found = self.inner.lock().members.contains(url);
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn remember(&self, url: &str) {
        let mut inner = self.inner.lock();
        if inner.members.contains(url) {
            return;
        }

        inner.members.insert(url.to_owned());
        inner.order.push_back(url.to_owned());

        while inner.order.len() > self.capacity.get() {
            if let Some(oldest) = inner.order.pop_front() {
                inner.members.remove(&oldest);
                trace!(url = %oldest, "Evicted loaded url");
            }
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.members.clear();
        inner.order.clear();
        debug!("Cleared preload cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_has() {
        let cache = MediaPreloadCache::new(10);

        cache.remember("u1");

        assert!(cache.has("u1"));
        assert!(!cache.has("u2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_evicted_past_default_capacity() {
        let cache = MediaPreloadCache::default();

        for i in 0..=500 {
            cache.remember(&format!("u{i}"));
        }

        assert_eq!(cache.len(), 500);
        assert!(!cache.has("u0"));
        assert!(cache.has("u1"));
        assert!(cache.has("u500"));
    }

    #[test]
    fn test_lookup_does_not_refresh_position() {
        let cache = MediaPreloadCache::new(2);

        cache.remember("a");
        cache.remember("b");
        assert!(cache.has("a"));
        cache.remember("a");
        cache.remember("c");

        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = MediaPreloadCache::new(3);

        for i in 0..20 {
            cache.remember(&format!("u{i}"));
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = MediaPreloadCache::new(0);

        cache.remember("a");
        cache.remember("b");

        assert_eq!(cache.capacity(), 1);
        assert!(cache.has("b"));
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = MediaPreloadCache::new(10);
        cache.remember("a");

        let _ = cache.has("a");
        let _ = cache.has("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
