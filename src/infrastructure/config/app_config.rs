//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::image_size_policy::SizePolicy;
use crate::application::services::lazy_load::{
    DEFAULT_ROOT_MARGIN_PX, DEFAULT_THRESHOLD, MOBILE_ROOT_MARGIN_PX, ObserverOptions,
};
use crate::application::services::performance_monitor::{DEFAULT_SLOW_LOAD, DEFAULT_WINDOW};
use crate::domain::entities::DeviceCapabilities;
use crate::infrastructure::image::loader::DEFAULT_TIMEOUT_SECS;
use crate::infrastructure::image::memory_cache::{DEFAULT_CACHE_SIZE, EvictionPolicy};

pub(crate) const APP_NAME: &str = "gallery-images";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "college-memories";

/// Environment variables consulted for the CDN cloud name, in order.
pub const CLOUD_NAME_VARS: [&str; 2] = ["CLOUDINARY_CLOUD_NAME", "NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME"];

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Re-detect device capabilities on every call.
    #[serde(default)]
    pub development: bool,

    /// CDN configuration.
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Image loading configuration.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Lazy loading configuration.
    #[serde(default)]
    pub lazy_load: LazyLoadConfig,

    /// Performance monitor configuration.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// CDN configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdnConfig {
    /// Cloud name; when unset, hosted images fall back to query-parameter URLs.
    #[serde(default)]
    pub cloud_name: Option<String>,

    /// Site origin that relative image paths are fetched from.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Image loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Maximum entries in the memory cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cache eviction policy.
    #[serde(default)]
    pub eviction: EvictionPolicy,

    /// Request timeout in seconds; 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Size and quality thresholds.
    #[serde(default)]
    pub size: SizePolicy,

    /// Directory relative image paths are read from when no base URL is set.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
}

impl ImagesConfig {
    /// Request timeout, if enabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            eviction: EvictionPolicy::default(),
            timeout_secs: default_timeout_secs(),
            size: SizePolicy::default(),
            local_root: None,
        }
    }
}

/// Lazy loading configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LazyLoadConfig {
    /// Margin around the viewport on desktop and tablet.
    #[serde(default = "default_root_margin")]
    pub root_margin_px: f64,

    /// Margin around the viewport on mobile.
    #[serde(default = "default_mobile_root_margin")]
    pub mobile_root_margin_px: f64,

    /// Visible fraction that triggers a load.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LazyLoadConfig {
    /// Observer options for a device.
    #[must_use]
    pub fn options_for(&self, caps: &DeviceCapabilities) -> ObserverOptions {
        ObserverOptions {
            root_margin_px: if caps.is_mobile {
                self.mobile_root_margin_px
            } else {
                self.root_margin_px
            },
            threshold: self.threshold,
        }
    }
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            root_margin_px: default_root_margin(),
            mobile_root_margin_px: default_mobile_root_margin(),
            threshold: default_threshold(),
        }
    }
}

/// Performance monitor configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of retained samples.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Loads slower than this many milliseconds are logged.
    #[serde(default = "default_slow_load_ms")]
    pub slow_load_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            slow_load_ms: default_slow_load_ms(),
        }
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_root_margin() -> f64 {
    DEFAULT_ROOT_MARGIN_PX
}

fn default_mobile_root_margin() -> f64 {
    MOBILE_ROOT_MARGIN_PX
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

#[allow(clippy::cast_possible_truncation)]
fn default_slow_load_ms() -> u64 {
    DEFAULT_SLOW_LOAD.as_millis() as u64
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if args.development {
            self.development = true;
        }
        if let Some(cloud_name) = &args.cloud_name {
            self.cdn.cloud_name = Some(cloud_name.clone());
        }
        if let Some(base_url) = &args.base_url {
            self.cdn.base_url = Some(base_url.clone());
        }
        if let Some(local_root) = &args.local_root {
            self.images.local_root = Some(local_root.clone());
        }
        if let Some(capacity) = args.cache_capacity {
            self.images.cache_capacity = capacity;
        }
        if let Some(eviction) = args.eviction {
            self.images.eviction = eviction;
        }
    }

    /// Fills the cloud name from the environment when the file left it unset.
    pub fn apply_env(&mut self) {
        if self.cdn.cloud_name.is_some() {
            return;
        }
        self.cdn.cloud_name = CLOUD_NAME_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty());
    }

    /// Returns the performance slow-load threshold.
    #[must_use]
    pub const fn slow_load(&self) -> Duration {
        Duration::from_millis(self.performance.slow_load_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            development: false,
            cdn: CdnConfig::default(),
            images: ImagesConfig::default(),
            lazy_load: LazyLoadConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}
