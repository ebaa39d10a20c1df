//! Device capability descriptor.

use serde::{Deserialize, Serialize};

/// Width reported when no browser environment is available.
pub const SERVER_SCREEN_WIDTH: u32 = 1920;

/// Height reported when no browser environment is available.
pub const SERVER_SCREEN_HEIGHT: u32 = 1080;

/// Operating platform inferred from the user agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Anything that is neither Android nor iOS.
    #[default]
    Desktop,
    /// Android phones and tablets.
    Android,
    /// iPhone, iPad and iPod.
    Ios,
}

/// Screen orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    Portrait,
    /// Wider than tall (or square).
    #[default]
    Landscape,
}

impl Orientation {
    /// Derives the orientation from viewport dimensions.
    #[must_use]
    pub const fn from_dimensions(width: u32, height: u32) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// Preferred color scheme reported by the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light scheme.
    #[default]
    Light,
    /// Dark scheme.
    Dark,
}

/// Snapshot of what the current device can handle.
///
/// Computed once per detector and treated as immutable afterwards.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    /// Phone-class device.
    pub is_mobile: bool,
    /// Tablet-class device or tablet-sized viewport.
    pub is_tablet: bool,
    /// Neither mobile nor tablet.
    pub is_desktop: bool,
    /// Device should receive smaller, cheaper images.
    pub is_low_memory_device: bool,
    /// Network reports data saver or a 3G-or-worse link.
    pub is_slow_connection: bool,
    /// User asked for reduced motion.
    pub prefers_reduced_motion: bool,
    /// Viewport width in CSS pixels.
    pub screen_width: u32,
    /// Viewport height in CSS pixels.
    pub screen_height: u32,
    /// Physical pixels per CSS pixel.
    pub device_pixel_ratio: f64,
    /// Platform family.
    pub platform: Platform,
    /// Current orientation.
    pub orientation: Orientation,
    /// Touch input available.
    pub touch_enabled: bool,
    /// Preferred color scheme.
    pub color_scheme: ColorScheme,
}

impl DeviceCapabilities {
    /// Fixed descriptor used outside a browser context.
    #[must_use]
    pub const fn server_default() -> Self {
        Self {
            is_mobile: false,
            is_tablet: false,
            is_desktop: true,
            is_low_memory_device: false,
            is_slow_connection: false,
            prefers_reduced_motion: false,
            screen_width: SERVER_SCREEN_WIDTH,
            screen_height: SERVER_SCREEN_HEIGHT,
            device_pixel_ratio: 1.0,
            platform: Platform::Desktop,
            orientation: Orientation::Landscape,
            touch_enabled: false,
            color_scheme: ColorScheme::Light,
        }
    }

    /// Returns true when image size and quality should be reduced.
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        self.is_low_memory_device || self.is_slow_connection
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::server_default()
    }
}
