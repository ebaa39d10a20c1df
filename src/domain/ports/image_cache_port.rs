//! Port definitions for image caching and fetching.

use bytes::Bytes;

use crate::domain::entities::CacheEntry;
use crate::domain::errors::ImageResult;

/// Port for the loaded-image cache, keyed by resolved URL.
/// Implementations must be thread-safe.
pub trait ImageCachePort: Send + Sync {
    /// Returns the entry for `key`, if cached.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Stores an entry, evicting according to the cache policy.
    fn set(&self, key: String, entry: CacheEntry);

    /// Returns true if `key` is cached.
    fn has(&self, key: &str) -> bool;

    /// Returns the current number of cached entries.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    fn clear(&self);
}

/// Port for downloading image bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches the body at `url`. Failures are not retried.
    async fn fetch(&self, url: &str) -> ImageResult<Bytes>;
}
