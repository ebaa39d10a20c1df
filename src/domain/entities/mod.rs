//! Domain entities.

mod capabilities;
mod image;
mod performance;
mod preferences;

pub use capabilities::{
    ColorScheme, DeviceCapabilities, Orientation, Platform, SERVER_SCREEN_HEIGHT,
    SERVER_SCREEN_WIDTH,
};
pub use image::{
    Breakpoint, CacheEntry, ImageReference, ImageSizeDecision, ImageStatus, ResponsiveVariantSet,
};
pub use performance::{PerformanceMetrics, PerformanceSample};
pub use preferences::{ThemeMode, UserPreferences};
