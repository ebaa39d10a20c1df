//! Application-level context owning the shared image pipeline state.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::application::services::capability_detector::CapabilityDetector;
use crate::application::services::image_card::ResolvedImage;
use crate::application::services::lazy_load::{ObserverHandle, create_lazy_load_observer};
use crate::application::services::performance_monitor::PerformanceMonitor;
use crate::domain::entities::{
    Breakpoint, DeviceCapabilities, ImageReference, ImageSizeDecision, PerformanceMetrics,
    ResponsiveVariantSet, UserPreferences,
};
use crate::domain::ports::{EnvironmentSource, ImageFetchPort};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::image::{ImageLoader, MemoryImageCache, variants_for};

/// Everything needed to display one image, as computed for this device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlan {
    /// Device the plan was computed for.
    pub capabilities: DeviceCapabilities,
    /// Container width the plan targets.
    pub container_width: u32,
    /// Chosen size and quality.
    pub decision: ImageSizeDecision,
    /// URL for the exact decision.
    pub url: String,
    /// All breakpoint variants.
    pub variants: ResponsiveVariantSet,
    /// Breakpoint that best covers the decision.
    pub breakpoint: Breakpoint,
}

/// Shared state for one gallery session: detector, cache, monitor and loader.
pub struct GalleryContext {
    config: AppConfig,
    detector: CapabilityDetector,
    preferences: Mutex<UserPreferences>,
    cache: Arc<MemoryImageCache>,
    loader: Arc<ImageLoader>,
}

impl std::fmt::Debug for GalleryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryContext")
            .field("detector", &self.detector)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl GalleryContext {
    /// Wires the pipeline from configuration.
    #[must_use]
    pub fn new(
        config: AppConfig,
        source: Arc<dyn EnvironmentSource>,
        fetcher: Arc<dyn ImageFetchPort>,
        preferences: UserPreferences,
    ) -> Self {
        let detector = CapabilityDetector::new(source).development(config.development);
        let cache = Arc::new(MemoryImageCache::new(
            config.images.cache_capacity,
            config.images.eviction,
        ));
        let monitor = Arc::new(Mutex::new(PerformanceMonitor::new(
            config.performance.window,
            config.slow_load(),
        )));
        let loader = Arc::new(
            ImageLoader::new(fetcher, cache.clone(), monitor)
                .with_policy(config.images.size)
                .with_cloud_name(config.cdn.cloud_name.clone()),
        );

        Self {
            config,
            detector,
            preferences: Mutex::new(preferences),
            cache,
            loader,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Device capabilities with user preference overrides applied.
    #[must_use]
    pub fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = self.detector.capabilities();
        let prefs = self.preferences.lock();
        if prefs.reduce_motion {
            caps.prefers_reduced_motion = true;
        }
        if prefs.data_saver {
            caps.is_slow_connection = true;
        }
        caps
    }

    /// Current user preferences.
    #[must_use]
    pub fn preferences(&self) -> UserPreferences {
        self.preferences.lock().clone()
    }

    /// Replaces the user preferences.
    pub fn set_preferences(&self, preferences: UserPreferences) {
        *self.preferences.lock() = preferences;
    }

    /// Whether card animations should run.
    #[must_use]
    pub fn animations_enabled(&self) -> bool {
        let enabled = self.preferences.lock().enable_animations;
        enabled && !self.capabilities().prefers_reduced_motion
    }

    /// Creates a lazy load observer tuned for this device.
    #[must_use]
    pub fn observer(&self) -> ObserverHandle {
        let caps = self.capabilities();
        create_lazy_load_observer(
            self.detector.observer_supported(),
            self.config.lazy_load.options_for(&caps),
        )
    }

    /// Resolves the URL for a reference in a container.
    #[must_use]
    pub fn resolve(&self, reference: &ImageReference, container_width: u32) -> ResolvedImage {
        self.loader
            .resolve(reference, container_width, &self.capabilities())
    }

    /// Computes the full plan for a reference.
    #[must_use]
    pub fn plan(&self, reference: &ImageReference, container_width: u32) -> ImagePlan {
        let capabilities = self.capabilities();
        let resolved = self.loader.resolve(reference, container_width, &capabilities);
        let variants = variants_for(reference, self.config.cdn.cloud_name.as_deref());
        let (breakpoint, _) = variants.for_width(resolved.decision.width);

        ImagePlan {
            capabilities,
            container_width,
            decision: resolved.decision,
            url: resolved.url,
            variants,
            breakpoint,
        }
    }

    /// Shared loader.
    #[must_use]
    pub const fn loader(&self) -> &Arc<ImageLoader> {
        &self.loader
    }

    /// Shared cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<MemoryImageCache> {
        &self.cache
    }

    /// Performance snapshot.
    #[must_use]
    pub fn metrics(&self) -> PerformanceMetrics {
        self.loader.monitor().lock().metrics()
    }
}
