//! Port definition for the rendered-image preload cache.

/// Remembers which render URLs have finished loading.
/// Implementations must be thread-safe.
pub trait PreloadCachePort: Send + Sync {
    /// Returns true if the URL has already loaded. No side effect on membership.
    fn has(&self, url: &str) -> bool;

    /// Marks the URL as loaded.
    fn remember(&self, url: &str);

    /// Returns the current number of remembered URLs.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every URL.
    fn clear(&self);
}
