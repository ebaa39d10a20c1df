//! Port definitions (interfaces for external adapters).

mod environment_port;
mod image_cache_port;

pub use environment_port::{
    ConnectionInfo, DeviceClass, DeviceClassifier, EnvironmentSource, EnvironmentSnapshot,
};
pub use image_cache_port::{ImageCachePort, ImageFetchPort};

#[cfg(test)]
pub use environment_port::{MockDeviceClassifier, MockEnvironmentSource};
#[cfg(test)]
pub use image_cache_port::MockImageFetchPort;
