//! Image load timing records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded image load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    /// Wall time between request start and load completion, in milliseconds.
    pub load_time_ms: f64,
    /// Decoded area in square pixels.
    pub image_size_px: u64,
    /// When the sample was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of the performance window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Retained samples, oldest first.
    pub image_load_times: Vec<PerformanceSample>,
    /// Mean load time over the retained samples.
    pub average_load_time: f64,
    /// Every load ever recorded, including trimmed ones.
    pub total_images_loaded: u64,
}
