//! Application layer containing the image pipeline services.

/// Shared pipeline state.
pub mod context;
/// Lazily loaded card grid.
pub mod gallery_view;
/// Pipeline services.
pub mod services;

pub use context::{GalleryContext, ImagePlan};
pub use gallery_view::GalleryView;
pub use services::capability_detector::{CapabilityDetector, UserAgentClassifier};
pub use services::image_card::{CardFallback, ImageCard, ResolvedImage, fallback_initials};
pub use services::image_size_policy::{SizePolicy, optimal_image_size};
pub use services::lazy_load::{
    ElementId, ElementLayout, LazyLoadScheduler, ObserverHandle, ObserverOptions, Subscription,
    Viewport, create_lazy_load_observer,
};
pub use services::performance_monitor::PerformanceMonitor;
