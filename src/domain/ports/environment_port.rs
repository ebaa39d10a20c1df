//! Port definitions for reading the client environment.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Platform, SERVER_SCREEN_HEIGHT, SERVER_SCREEN_WIDTH};

/// Network Information API readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// `effectiveType`, e.g. `"4g"` or `"slow-2g"`.
    #[serde(default)]
    pub effective_type: Option<String>,
    /// `saveData` flag.
    #[serde(default)]
    pub save_data: Option<bool>,
}

/// Raw readings from a browser-like environment.
///
/// Every field is optional in practice; absent APIs are represented by
/// defaults so detection never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    /// `window.innerWidth`.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    /// `window.innerHeight`.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// `window.devicePixelRatio`.
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
    /// `navigator.userAgent`.
    #[serde(default)]
    pub user_agent: String,
    /// `navigator.connection`, when exposed.
    #[serde(default)]
    pub connection: Option<ConnectionInfo>,
    /// `navigator.deviceMemory` in gigabytes, when exposed.
    #[serde(default)]
    pub device_memory_gb: Option<f64>,
    /// `(prefers-reduced-motion: reduce)` matches.
    #[serde(default)]
    pub prefers_reduced_motion: bool,
    /// `(prefers-color-scheme: dark)` matches.
    #[serde(default)]
    pub prefers_dark: bool,
    /// `navigator.maxTouchPoints`.
    #[serde(default)]
    pub max_touch_points: u32,
    /// Whether an intersection observer is available.
    #[serde(default = "default_true")]
    pub intersection_observer_supported: bool,
}

const fn default_viewport_width() -> u32 {
    SERVER_SCREEN_WIDTH
}

const fn default_viewport_height() -> u32 {
    SERVER_SCREEN_HEIGHT
}

fn default_pixel_ratio() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            viewport_width: SERVER_SCREEN_WIDTH,
            viewport_height: SERVER_SCREEN_HEIGHT,
            device_pixel_ratio: 1.0,
            user_agent: String::new(),
            connection: None,
            device_memory_gb: None,
            prefers_reduced_motion: false,
            prefers_dark: false,
            max_touch_points: 0,
            intersection_observer_supported: true,
        }
    }
}

/// Port for reading the environment.
#[cfg_attr(test, mockall::automock)]
pub trait EnvironmentSource: Send + Sync {
    /// Returns the current readings, or `None` outside a browser context.
    fn snapshot(&self) -> Option<EnvironmentSnapshot>;
}

/// Form factor decided by a [`DeviceClassifier`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceClass {
    /// Phone-class device.
    pub is_mobile: bool,
    /// Tablet-class device.
    pub is_tablet: bool,
    /// Platform family.
    pub platform: Platform,
}

/// Pluggable mobile detection strategy.
///
/// The default is user-agent sniffing; client hints or server-side
/// detection can be substituted without touching call sites.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceClassifier: Send + Sync {
    /// Classifies the device from its user agent and viewport width.
    fn classify(&self, user_agent: &str, viewport_width: u32) -> DeviceClass;
}
