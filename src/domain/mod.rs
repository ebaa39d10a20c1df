//! Domain layer with core entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{CacheEntry, DeviceCapabilities, ImageReference, ImageSizeDecision};
pub use errors::{ImageError, ImageResult};
pub use ports::{DeviceClassifier, EnvironmentSource, ImageCachePort, ImageFetchPort};
