//! Rolling window of image load timings, for diagnostics only.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::warn;

use crate::domain::entities::{PerformanceMetrics, PerformanceSample};

/// Default number of retained samples.
pub const DEFAULT_WINDOW: usize = 50;

/// Loads slower than this are logged.
pub const DEFAULT_SLOW_LOAD: Duration = Duration::from_millis(1000);

/// Records image load durations in a bounded ring.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    samples: VecDeque<PerformanceSample>,
    window: usize,
    slow_load: Duration,
    average_load_time: f64,
    total_images_loaded: u64,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_SLOW_LOAD)
    }
}

impl PerformanceMonitor {
    /// Creates a monitor retaining `window` samples.
    #[must_use]
    pub fn new(window: usize, slow_load: Duration) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            slow_load,
            average_load_time: 0.0,
            total_images_loaded: 0,
        }
    }

    /// Records one load spanning `start..end` for an image of `image_size_px` square pixels.
    ///
    /// Returns true if the load counted as slow.
    pub fn record_image_load_time(
        &mut self,
        start: Instant,
        end: Instant,
        image_size_px: u64,
    ) -> bool {
        self.record_duration(end.saturating_duration_since(start), image_size_px)
    }

    /// Records one load of the given duration.
    ///
    /// Returns true if it exceeded the slow-load threshold and was logged.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_duration(&mut self, load_time: Duration, image_size_px: u64) -> bool {
        let load_time_ms = load_time.as_secs_f64() * 1000.0;

        self.samples.push_back(PerformanceSample {
            load_time_ms,
            image_size_px,
            timestamp: Utc::now(),
        });
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
        self.total_images_loaded += 1;

        let sum: f64 = self.samples.iter().map(|s| s.load_time_ms).sum();
        self.average_load_time = sum / self.samples.len() as f64;

        let slow = load_time > self.slow_load;
        if slow {
            warn!(load_time_ms, image_size_px, "Slow image load");
        }
        slow
    }

    /// Returns a snapshot of the retained window.
    #[must_use]
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            image_load_times: self.samples.iter().cloned().collect(),
            average_load_time: self.average_load_time,
            total_images_loaded: self.total_images_loaded,
        }
    }

    /// Clears samples and counters.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.average_load_time = 0.0;
        self.total_images_loaded = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_window_is_trimmed_but_total_is_not() {
        let mut monitor = PerformanceMonitor::default();
        let start = Instant::now();

        for i in 0..60 {
            monitor.record_image_load_time(start, start + Duration::from_millis(i), 100);
        }

        let metrics = monitor.metrics();
        assert_eq!(metrics.image_load_times.len(), 50);
        assert_eq!(metrics.total_images_loaded, 60);
        // oldest ten dropped
        assert!((metrics.image_load_times[0].load_time_ms - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_over_retained_window() {
        let mut monitor = PerformanceMonitor::new(2, DEFAULT_SLOW_LOAD);

        monitor.record_duration(Duration::from_millis(100), 1);
        monitor.record_duration(Duration::from_millis(200), 1);
        assert!((monitor.metrics().average_load_time - 150.0).abs() < 1e-6);

        monitor.record_duration(Duration::from_millis(400), 1);
        assert!((monitor.metrics().average_load_time - 300.0).abs() < 1e-6);
        assert_eq!(monitor.metrics().total_images_loaded, 3);
    }

    #[test]
    fn test_reversed_instants_record_zero() {
        let mut monitor = PerformanceMonitor::default();
        let end = Instant::now();
        let start = end + Duration::from_millis(5);

        monitor.record_image_load_time(start, end, 10);
        assert!(monitor.metrics().image_load_times[0].load_time_ms.abs() < f64::EPSILON);
    }

    #[test]
    fn test_slow_load_is_still_recorded() {
        let mut monitor = PerformanceMonitor::default();
        monitor.record_duration(Duration::from_millis(1500), 640 * 480);

        let metrics = monitor.metrics();
        assert_eq!(metrics.total_images_loaded, 1);
        assert_eq!(metrics.image_load_times[0].image_size_px, 640 * 480);
    }

    #[test_case(999, false ; "under threshold")]
    #[test_case(1000, false ; "exactly at threshold")]
    #[test_case(1001, true ; "over threshold")]
    fn test_slow_load_boundary(millis: u64, expected: bool) {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(
            monitor.record_duration(Duration::from_millis(millis), 1),
            expected
        );
    }

    #[test]
    fn test_slow_threshold_is_configurable() {
        let mut monitor = PerformanceMonitor::new(DEFAULT_WINDOW, Duration::from_millis(200));
        let start = Instant::now();

        assert!(monitor.record_image_load_time(start, start + Duration::from_millis(250), 1));
        assert!(!monitor.record_image_load_time(start, start + Duration::from_millis(150), 1));
    }

    #[test]
    fn test_reset() {
        let mut monitor = PerformanceMonitor::default();
        monitor.record_duration(Duration::from_millis(10), 1);
        monitor.reset();

        let metrics = monitor.metrics();
        assert!(metrics.image_load_times.is_empty());
        assert_eq!(metrics.total_images_loaded, 0);
        assert!(metrics.average_load_time.abs() < f64::EPSILON);
    }
}
