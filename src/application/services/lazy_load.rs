//! Fire-once lazy loading driven by viewport intersection.
//!
//! Elements register a one-shot [`Subscription`]. Each call to
//! [`LazyLoadScheduler::process`] compares the current viewport (expanded by
//! the root margin) against element layouts; the first time an element
//! intersects enough, its callback fires and the element is unobserved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::entities::DeviceCapabilities;

/// Default margin around the viewport, in pixels.
pub const DEFAULT_ROOT_MARGIN_PX: f64 = 50.0;

/// Tighter margin for mobile devices, delaying fetch start.
pub const MOBILE_ROOT_MARGIN_PX: f64 = 25.0;

/// Default fraction of the element that must be inside the expanded viewport.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Identifier of an observed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    /// Pixels added above and below the viewport.
    pub root_margin_px: f64,
    /// Minimum visible fraction (0.0-1.0) to trigger.
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ObserverOptions {
    /// Default options with the margin adapted to the device.
    #[must_use]
    pub fn for_capabilities(caps: &DeviceCapabilities) -> Self {
        if caps.is_mobile {
            Self {
                root_margin_px: MOBILE_ROOT_MARGIN_PX,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }
}

/// Scroll position and height of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Document offset of the viewport's top edge.
    pub scroll_top: f64,
    /// Viewport height.
    pub height: f64,
}

/// Vertical placement of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementLayout {
    /// Element being measured.
    pub id: ElementId,
    /// Document offset of the element's top edge.
    pub top: f64,
    /// Element height.
    pub height: f64,
}

impl ElementLayout {
    /// Fraction of the element inside `[start, end]`, or `None` if disjoint.
    ///
    /// An element touching an edge intersects with ratio 0, so it only
    /// fires under a zero threshold.
    fn intersection_ratio(&self, start: f64, end: f64) -> Option<f64> {
        let bottom = self.top + self.height.max(0.0);
        if self.height <= 0.0 {
            return (self.top >= start && self.top <= end).then_some(1.0);
        }
        let overlap = bottom.min(end) - self.top.max(start);
        (overlap >= 0.0).then(|| overlap / self.height)
    }
}

type Callback = Box<dyn FnOnce(ElementId) + Send>;

/// A callback that fires at most once.
pub struct Subscription {
    id: ElementId,
    callback: Callback,
}

impl Subscription {
    /// Wraps a callback for `id`.
    pub fn new(id: ElementId, callback: impl FnOnce(ElementId) + Send + 'static) -> Self {
        Self {
            id,
            callback: Box::new(callback),
        }
    }

    /// Consumes the subscription and runs its callback.
    pub fn fire(self) {
        (self.callback)(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Intersection-driven scheduler holding one-shot subscriptions.
#[derive(Debug, Default)]
pub struct LazyLoadScheduler {
    options: ObserverOptions,
    subscriptions: HashMap<ElementId, Subscription>,
}

impl LazyLoadScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            subscriptions: HashMap::new(),
        }
    }

    /// Returns the active options.
    #[must_use]
    pub const fn options(&self) -> ObserverOptions {
        self.options
    }

    /// Registers `callback` to fire the first time `id` becomes visible.
    /// Re-observing an element replaces its previous callback.
    pub fn observe(&mut self, id: ElementId, callback: impl FnOnce(ElementId) + Send + 'static) {
        self.subscriptions.insert(id, Subscription::new(id, callback));
    }

    /// Stops observing `id`. Returns true if it was observed.
    pub fn unobserve(&mut self, id: ElementId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Drops every subscription without firing.
    pub fn disconnect(&mut self) {
        if !self.subscriptions.is_empty() {
            debug!(count = self.subscriptions.len(), "Disconnecting lazy load observer");
        }
        self.subscriptions.clear();
    }

    /// Returns true if `id` is still waiting to become visible.
    #[must_use]
    pub fn is_observing(&self, id: ElementId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    /// Number of elements still waiting.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Fires and unobserves every observed element that now intersects.
    ///
    /// Returns the fired ids in layout order.
    pub fn process(&mut self, viewport: Viewport, layouts: &[ElementLayout]) -> Vec<ElementId> {
        let start = viewport.scroll_top - self.options.root_margin_px;
        let end = viewport.scroll_top + viewport.height + self.options.root_margin_px;
        let mut fired = Vec::new();

        for layout in layouts {
            if !self.subscriptions.contains_key(&layout.id) {
                continue;
            }
            let Some(ratio) = layout.intersection_ratio(start, end) else {
                continue;
            };
            if ratio < self.options.threshold {
                continue;
            }
            if let Some(subscription) = self.subscriptions.remove(&layout.id) {
                trace!(element = %layout.id, ratio, "Element entered viewport");
                subscription.fire();
                fired.push(layout.id);
            }
        }

        fired
    }
}

/// Observer returned by [`create_lazy_load_observer`].
///
/// Without intersection support every method is a silent no-op, so images
/// registered on such a handle never load.
#[derive(Debug)]
pub enum ObserverHandle {
    /// Working scheduler.
    Active(LazyLoadScheduler),
    /// Environment without intersection support.
    Noop,
}

impl ObserverHandle {
    /// See [`LazyLoadScheduler::observe`].
    pub fn observe(&mut self, id: ElementId, callback: impl FnOnce(ElementId) + Send + 'static) {
        if let Self::Active(scheduler) = self {
            scheduler.observe(id, callback);
        }
    }

    /// See [`LazyLoadScheduler::unobserve`].
    pub fn unobserve(&mut self, id: ElementId) -> bool {
        match self {
            Self::Active(scheduler) => scheduler.unobserve(id),
            Self::Noop => false,
        }
    }

    /// See [`LazyLoadScheduler::disconnect`].
    pub fn disconnect(&mut self) {
        if let Self::Active(scheduler) = self {
            scheduler.disconnect();
        }
    }

    /// See [`LazyLoadScheduler::process`].
    pub fn process(&mut self, viewport: Viewport, layouts: &[ElementLayout]) -> Vec<ElementId> {
        match self {
            Self::Active(scheduler) => scheduler.process(viewport, layouts),
            Self::Noop => Vec::new(),
        }
    }

    /// Returns true for the no-op handle.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

/// Creates an observer, or a no-op handle when the environment lacks support.
#[must_use]
pub fn create_lazy_load_observer(supported: bool, options: ObserverOptions) -> ObserverHandle {
    if supported {
        ObserverHandle::Active(LazyLoadScheduler::new(options))
    } else {
        debug!("Intersection observer unsupported, lazy loading disabled");
        ObserverHandle::Noop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce(ElementId) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn layout(id: u64, top: f64, height: f64) -> ElementLayout {
        ElementLayout {
            id: ElementId(id),
            top,
            height,
        }
    }

    const VIEWPORT: Viewport = Viewport {
        scroll_top: 0.0,
        height: 800.0,
    };

    #[test]
    fn test_fires_once_and_unobserves() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions::default());
        let (count, cb) = counter();
        scheduler.observe(ElementId(1), cb);

        let fired = scheduler.process(VIEWPORT, &[layout(1, 100.0, 200.0)]);
        assert_eq!(fired, vec![ElementId(1)]);
        assert!(!scheduler.is_observing(ElementId(1)));

        let fired = scheduler.process(VIEWPORT, &[layout(1, 100.0, 200.0)]);
        assert!(fired.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test_case(845.0, 50.0, true ; "inside_margin")]
    #[test_case(851.0, 50.0, false ; "beyond_margin")]
    #[test_case(850.0, 50.0, true ; "touching_margin_edge")]
    #[test_case(-150.0, 50.0, true ; "touching_top_edge")]
    #[test_case(830.0, 25.0, false ; "beyond_mobile_margin")]
    #[test_case(820.0, 25.0, true ; "inside_mobile_margin")]
    fn test_root_margin(top: f64, margin: f64, expected: bool) {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions {
            root_margin_px: margin,
            threshold: 0.0,
        });
        scheduler.observe(ElementId(7), |_| {});

        let fired = scheduler.process(VIEWPORT, &[layout(7, top, 100.0)]);
        assert_eq!(!fired.is_empty(), expected);
    }

    #[test]
    fn test_threshold_requires_visible_fraction() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions {
            root_margin_px: 0.0,
            threshold: 0.1,
        });
        scheduler.observe(ElementId(1), |_| {});

        // 5% visible
        assert!(scheduler.process(VIEWPORT, &[layout(1, 790.0, 200.0)]).is_empty());
        // 25% visible
        assert_eq!(
            scheduler.process(VIEWPORT, &[layout(1, 750.0, 200.0)]),
            vec![ElementId(1)]
        );
    }

    #[test]
    fn test_touching_edge_needs_zero_threshold() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions {
            root_margin_px: 0.0,
            threshold: 0.1,
        });
        scheduler.observe(ElementId(1), |_| {});

        assert!(scheduler.process(VIEWPORT, &[layout(1, 800.0, 200.0)]).is_empty());
        assert!(scheduler.is_observing(ElementId(1)));
    }

    #[test]
    fn test_scrolling_brings_element_in() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions::default());
        scheduler.observe(ElementId(3), |_| {});
        let layouts = [layout(3, 2000.0, 300.0)];

        assert!(scheduler.process(VIEWPORT, &layouts).is_empty());
        let scrolled = Viewport {
            scroll_top: 1500.0,
            height: 800.0,
        };
        assert_eq!(scheduler.process(scrolled, &layouts), vec![ElementId(3)]);
    }

    #[test]
    fn test_zero_height_element() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions::default());
        scheduler.observe(ElementId(1), |_| {});
        scheduler.observe(ElementId(2), |_| {});

        let fired = scheduler.process(VIEWPORT, &[layout(1, 400.0, 0.0), layout(2, 5000.0, 0.0)]);
        assert_eq!(fired, vec![ElementId(1)]);
    }

    #[test]
    fn test_unobserve_and_disconnect() {
        let mut scheduler = LazyLoadScheduler::new(ObserverOptions::default());
        let (count, cb) = counter();
        scheduler.observe(ElementId(1), cb);
        scheduler.observe(ElementId(2), |_| {});
        scheduler.observe(ElementId(3), |_| {});

        assert!(scheduler.unobserve(ElementId(1)));
        assert!(!scheduler.unobserve(ElementId(1)));
        assert_eq!(scheduler.observed_count(), 2);

        scheduler.disconnect();
        assert_eq!(scheduler.observed_count(), 0);
        assert!(scheduler.process(VIEWPORT, &[layout(2, 0.0, 10.0)]).is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_noop_handle_is_silent() {
        let mut handle = create_lazy_load_observer(false, ObserverOptions::default());
        let (count, cb) = counter();

        assert!(handle.is_noop());
        handle.observe(ElementId(1), cb);
        assert!(handle.process(VIEWPORT, &[layout(1, 0.0, 100.0)]).is_empty());
        assert!(!handle.unobserve(ElementId(1)));
        handle.disconnect();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_options_for_mobile() {
        let mut caps = DeviceCapabilities::server_default();
        assert!((ObserverOptions::for_capabilities(&caps).root_margin_px - 50.0).abs() < f64::EPSILON);

        caps.is_mobile = true;
        let options = ObserverOptions::for_capabilities(&caps);
        assert!((options.root_margin_px - 25.0).abs() < f64::EPSILON);
        assert!((options.threshold - 0.1).abs() < f64::EPSILON);
    }
}
