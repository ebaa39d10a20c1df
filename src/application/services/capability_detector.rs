//! Device capability detection.
//!
//! Reads an [`EnvironmentSnapshot`] through an [`EnvironmentSource`] and turns
//! it into a [`DeviceCapabilities`] descriptor. Detection never fails: a
//! missing environment yields the server default and missing APIs read as
//! false.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::domain::entities::{ColorScheme, DeviceCapabilities, Orientation, Platform};
use crate::domain::ports::{DeviceClass, DeviceClassifier, EnvironmentSource, EnvironmentSnapshot};

/// Viewports narrower than this are treated as phones.
pub const MOBILE_MAX_WIDTH: u32 = 768;

/// Inclusive viewport range treated as tablet-sized.
pub const TABLET_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 768..=1024;

/// Mobile viewports narrower than this count as low memory.
pub const LOW_MEMORY_MIN_WIDTH: u32 = 375;

/// `navigator.deviceMemory` below this (in GB) counts as low memory.
pub const LOW_MEMORY_THRESHOLD_GB: f64 = 4.0;

/// Effective connection types considered slow.
pub const SLOW_CONNECTION_TYPES: [&str; 3] = ["slow-2g", "2g", "3g"];

/// User-agent sniffing classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserAgentClassifier;

impl UserAgentClassifier {
    fn mobile_regex() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
                .expect("Invalid regex")
        })
    }

    fn ios_regex() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"(?i)iPad|iPhone|iPod").expect("Invalid regex"))
    }

    fn is_tablet_agent(user_agent: &str) -> bool {
        let lower = user_agent.to_ascii_lowercase();
        lower.contains("ipad") || (lower.contains("android") && !lower.contains("mobile"))
    }
}

impl DeviceClassifier for UserAgentClassifier {
    fn classify(&self, user_agent: &str, viewport_width: u32) -> DeviceClass {
        let is_mobile =
            Self::mobile_regex().is_match(user_agent) || viewport_width < MOBILE_MAX_WIDTH;
        let is_tablet =
            Self::is_tablet_agent(user_agent) || TABLET_WIDTH_RANGE.contains(&viewport_width);

        let platform = if Self::ios_regex().is_match(user_agent) {
            Platform::Ios
        } else if user_agent.to_ascii_lowercase().contains("android") {
            Platform::Android
        } else {
            Platform::Desktop
        };

        DeviceClass {
            is_mobile,
            is_tablet,
            platform,
        }
    }
}

/// Builds a descriptor from raw readings.
#[must_use]
pub fn detect_capabilities(
    snapshot: &EnvironmentSnapshot,
    classifier: &dyn DeviceClassifier,
) -> DeviceCapabilities {
    let width = snapshot.viewport_width;
    let height = snapshot.viewport_height;
    let dpr = if snapshot.device_pixel_ratio > 0.0 {
        snapshot.device_pixel_ratio
    } else {
        1.0
    };

    let class = classifier.classify(&snapshot.user_agent, width);

    let is_low_memory_device = (dpr < 2.0 && class.is_mobile)
        || (width < LOW_MEMORY_MIN_WIDTH && class.is_mobile)
        || snapshot
            .device_memory_gb
            .is_some_and(|gb| gb < LOW_MEMORY_THRESHOLD_GB);

    let is_slow_connection = snapshot.connection.as_ref().is_some_and(|conn| {
        conn.save_data == Some(true)
            || conn
                .effective_type
                .as_deref()
                .is_some_and(|t| SLOW_CONNECTION_TYPES.contains(&t))
    });

    DeviceCapabilities {
        is_mobile: class.is_mobile,
        is_tablet: class.is_tablet,
        is_desktop: !class.is_mobile && !class.is_tablet,
        is_low_memory_device,
        is_slow_connection,
        prefers_reduced_motion: snapshot.prefers_reduced_motion,
        screen_width: width,
        screen_height: height,
        device_pixel_ratio: dpr,
        platform: class.platform,
        orientation: Orientation::from_dimensions(width, height),
        touch_enabled: snapshot.max_touch_points > 0,
        color_scheme: if snapshot.prefers_dark {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        },
    }
}

/// Memoizing capability provider.
///
/// Each detector owns its memo; there is no process-wide cache.
pub struct CapabilityDetector {
    source: Arc<dyn EnvironmentSource>,
    classifier: Arc<dyn DeviceClassifier>,
    cached: OnceLock<Detection>,
    development: bool,
}

/// Everything read from one environment snapshot.
#[derive(Debug, Clone)]
struct Detection {
    capabilities: DeviceCapabilities,
    observer_supported: bool,
}

impl std::fmt::Debug for CapabilityDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDetector")
            .field("cached", &self.cached.get())
            .field("development", &self.development)
            .finish_non_exhaustive()
    }
}

impl CapabilityDetector {
    /// Creates a detector using user-agent sniffing.
    #[must_use]
    pub fn new(source: Arc<dyn EnvironmentSource>) -> Self {
        Self::with_classifier(source, Arc::new(UserAgentClassifier))
    }

    /// Creates a detector with a custom classification strategy.
    #[must_use]
    pub fn with_classifier(
        source: Arc<dyn EnvironmentSource>,
        classifier: Arc<dyn DeviceClassifier>,
    ) -> Self {
        Self {
            source,
            classifier,
            cached: OnceLock::new(),
            development: false,
        }
    }

    /// In development mode every call re-reads the environment.
    #[must_use]
    pub const fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Returns the device capabilities, computing them on first access.
    #[must_use]
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.detection().capabilities
    }

    /// Returns true if lazy loading can rely on an intersection observer.
    ///
    /// Read from the same snapshot as [`Self::capabilities`].
    #[must_use]
    pub fn observer_supported(&self) -> bool {
        self.detection().observer_supported
    }

    fn detection(&self) -> Detection {
        if self.development {
            return self.compute();
        }
        self.cached.get_or_init(|| self.compute()).clone()
    }

    /// Drops the memoized descriptor so the next call re-reads the environment.
    pub fn reset(&mut self) {
        self.cached = OnceLock::new();
    }

    fn compute(&self) -> Detection {
        let Some(snapshot) = self.source.snapshot() else {
            debug!("No client environment, using server default capabilities");
            return Detection {
                capabilities: DeviceCapabilities::server_default(),
                observer_supported: false,
            };
        };

        let caps = detect_capabilities(&snapshot, self.classifier.as_ref());
        debug!(
            mobile = caps.is_mobile,
            tablet = caps.is_tablet,
            low_memory = caps.is_low_memory_device,
            slow = caps.is_slow_connection,
            width = caps.screen_width,
            dpr = caps.device_pixel_ratio,
            "Detected device capabilities"
        );
        Detection {
            capabilities: caps,
            observer_supported: snapshot.intersection_observer_supported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ConnectionInfo, MockEnvironmentSource};
    use test_case::test_case;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
    const ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Mobile Safari/537.36";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 14; SM-X710) AppleWebKit/537.36 Safari/537.36";
    const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

    fn snapshot(user_agent: &str, width: u32, height: u32, dpr: f64) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            viewport_width: width,
            viewport_height: height,
            device_pixel_ratio: dpr,
            user_agent: user_agent.to_string(),
            ..EnvironmentSnapshot::default()
        }
    }

    fn detect(snapshot: &EnvironmentSnapshot) -> DeviceCapabilities {
        detect_capabilities(snapshot, &UserAgentClassifier)
    }

    #[test_case(IPHONE, 390, true, false, Platform::Ios ; "iphone")]
    #[test_case(IPAD, 820, true, true, Platform::Ios ; "ipad")]
    #[test_case(ANDROID_PHONE, 412, true, false, Platform::Android ; "android_phone")]
    #[test_case(ANDROID_TABLET, 1280, true, true, Platform::Android ; "android_tablet")]
    #[test_case(DESKTOP, 1920, false, false, Platform::Desktop ; "desktop")]
    #[test_case(DESKTOP, 900, false, true, Platform::Desktop ; "desktop_tablet_width")]
    #[test_case(DESKTOP, 600, true, false, Platform::Desktop ; "desktop_narrow_window")]
    fn test_classification(
        ua: &str,
        width: u32,
        mobile: bool,
        tablet: bool,
        platform: Platform,
    ) {
        let caps = detect(&snapshot(ua, width, 800, 2.0));

        assert_eq!(caps.is_mobile, mobile);
        assert_eq!(caps.is_tablet, tablet);
        assert_eq!(caps.is_desktop, !mobile && !tablet);
        assert_eq!(caps.platform, platform);
    }

    #[test_case(IPHONE, 390, 1.5, None, true ; "mobile_low_dpr")]
    #[test_case(IPHONE, 360, 3.0, None, true ; "mobile_narrow")]
    #[test_case(IPHONE, 390, 3.0, None, false ; "mobile_high_dpr")]
    #[test_case(DESKTOP, 1920, 1.0, None, false ; "desktop_low_dpr")]
    #[test_case(DESKTOP, 1920, 1.0, Some(2.0), true ; "desktop_little_memory")]
    #[test_case(DESKTOP, 1920, 1.0, Some(8.0), false ; "desktop_plenty_memory")]
    fn test_low_memory(ua: &str, width: u32, dpr: f64, memory: Option<f64>, expected: bool) {
        let mut snap = snapshot(ua, width, 800, dpr);
        snap.device_memory_gb = memory;

        assert_eq!(detect(&snap).is_low_memory_device, expected);
    }

    #[test_case(None, None, false ; "no_connection_api")]
    #[test_case(Some("4g"), None, false ; "fast")]
    #[test_case(Some("3g"), None, true ; "three_g")]
    #[test_case(Some("slow-2g"), None, true ; "slow_two_g")]
    #[test_case(Some("4g"), Some(true), true ; "save_data")]
    #[test_case(Some("4g"), Some(false), false ; "save_data_off")]
    fn test_slow_connection(effective: Option<&str>, save_data: Option<bool>, expected: bool) {
        let mut snap = snapshot(DESKTOP, 1920, 1080, 1.0);
        snap.connection = (effective.is_some() || save_data.is_some()).then(|| ConnectionInfo {
            effective_type: effective.map(String::from),
            save_data,
        });

        assert_eq!(detect(&snap).is_slow_connection, expected);
    }

    #[test]
    fn test_misc_fields() {
        let mut snap = snapshot(IPHONE, 390, 844, 3.0);
        snap.max_touch_points = 5;
        snap.prefers_dark = true;
        snap.prefers_reduced_motion = true;

        let caps = detect(&snap);
        assert_eq!(caps.orientation, Orientation::Portrait);
        assert!(caps.touch_enabled);
        assert_eq!(caps.color_scheme, ColorScheme::Dark);
        assert!(caps.prefers_reduced_motion);
    }

    #[test]
    fn test_server_side_returns_default() {
        let mut source = MockEnvironmentSource::new();
        source.expect_snapshot().returning(|| None);
        let detector = CapabilityDetector::new(Arc::new(source));

        let caps = detector.capabilities();
        assert!(caps.is_desktop);
        assert!(!caps.is_mobile);
        assert_eq!(caps.screen_width, 1920);
        assert_eq!(caps.screen_height, 1080);
        assert!((caps.device_pixel_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capabilities_are_memoized() {
        let mut source = MockEnvironmentSource::new();
        source
            .expect_snapshot()
            .times(1)
            .returning(|| Some(snapshot(IPHONE, 390, 844, 3.0)));
        let detector = CapabilityDetector::new(Arc::new(source));

        let first = detector.capabilities();
        let second = detector.capabilities();
        assert_eq!(first, second);
        assert!(first.is_mobile);
    }

    #[test]
    fn test_development_mode_recomputes() {
        let mut source = MockEnvironmentSource::new();
        source
            .expect_snapshot()
            .times(2)
            .returning(|| Some(snapshot(DESKTOP, 1920, 1080, 1.0)));
        let detector = CapabilityDetector::new(Arc::new(source)).development(true);

        let _ = detector.capabilities();
        let _ = detector.capabilities();
    }

    #[test]
    fn test_reset_rereads_environment() {
        let mut source = MockEnvironmentSource::new();
        source
            .expect_snapshot()
            .times(2)
            .returning(|| Some(snapshot(DESKTOP, 1920, 1080, 1.0)));
        let mut detector = CapabilityDetector::new(Arc::new(source));

        let _ = detector.capabilities();
        detector.reset();
        let _ = detector.capabilities();
    }

    #[test]
    fn test_custom_classifier_is_used() {
        let mut source = MockEnvironmentSource::new();
        source
            .expect_snapshot()
            .returning(|| Some(snapshot(DESKTOP, 1920, 1080, 2.0)));
        let mut classifier = crate::domain::ports::MockDeviceClassifier::new();
        classifier.expect_classify().returning(|_, _| DeviceClass {
            is_mobile: true,
            is_tablet: false,
            platform: Platform::Android,
        });

        let detector = CapabilityDetector::with_classifier(Arc::new(source), Arc::new(classifier));
        let caps = detector.capabilities();

        assert!(caps.is_mobile);
        assert!(!caps.is_desktop);
        assert_eq!(caps.platform, Platform::Android);
    }

    #[test]
    fn test_zero_pixel_ratio_defaults_to_one() {
        let caps = detect(&snapshot(DESKTOP, 1920, 1080, 0.0));
        assert!((caps.device_pixel_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_observer_support_shares_memoized_snapshot() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let first = Arc::new(AtomicBool::new(true));
        let mut source = MockEnvironmentSource::new();
        source.expect_snapshot().returning(move || {
            first
                .swap(false, Ordering::SeqCst)
                .then(|| snapshot(IPHONE, 390, 844, 3.0))
        });
        let mut detector = CapabilityDetector::new(Arc::new(source));

        assert!(detector.capabilities().is_mobile);
        assert!(detector.observer_supported());

        detector.reset();
        assert!(!detector.observer_supported());
        assert!(detector.capabilities().is_desktop);
    }
}
