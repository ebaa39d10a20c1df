//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with FIFO or LRU eviction
//! - Responsive and CDN URL construction
//! - Async image loading pipeline

pub mod loader;
pub mod memory_cache;
pub mod responsive_urls;

pub use loader::{
    FetchTarget, HttpImageFetcher, ImageLoadedEvent, ImageLoader, ImageSource, LoadedImage,
};
pub use memory_cache::{CacheStats, EvictionPolicy, MemoryImageCache};
pub use responsive_urls::{
    extract_cloudinary_id, generate_responsive_image_urls, is_cloudinary_url, optimized_image_url,
    placeholder_url, variant_url_for, variants_for,
};
