//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Environment source adapters.
pub mod environment;
/// Image handling (caching, loading, URL construction).
pub mod image;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use environment::SnapshotEnvironment;
pub use image::{
    CacheStats, EvictionPolicy, HttpImageFetcher, ImageLoadedEvent, ImageLoader, MemoryImageCache,
    generate_responsive_image_urls, optimized_image_url,
};
