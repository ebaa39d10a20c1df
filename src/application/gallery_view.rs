//! Lazily loaded grid of image cards.
//!
//! Cards register with the context's observer on creation. Scroll updates
//! fire the one-shot subscriptions of cards entering the viewport, which
//! then start their loads; finished loads come back as
//! [`ImageLoadedEvent`]s and settle the cards.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::application::context::GalleryContext;
use crate::application::services::image_card::ImageCard;
use crate::application::services::lazy_load::{ElementId, ElementLayout, ObserverHandle, Viewport};
use crate::domain::entities::ImageReference;
use crate::infrastructure::image::ImageLoadedEvent;

/// Cards plus the observer driving them.
pub struct GalleryView {
    context: Arc<GalleryContext>,
    observer: ObserverHandle,
    cards: HashMap<ElementId, ImageCard>,
    container_widths: HashMap<ElementId, u32>,
    visible_tx: mpsc::UnboundedSender<ElementId>,
    visible_rx: mpsc::UnboundedReceiver<ElementId>,
    event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
}

impl std::fmt::Debug for GalleryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryView")
            .field("cards", &self.cards.len())
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}

impl GalleryView {
    /// Creates an empty view; load outcomes are sent on `event_tx`.
    #[must_use]
    pub fn new(
        context: Arc<GalleryContext>,
        event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    ) -> Self {
        let observer = context.observer();
        let (visible_tx, visible_rx) = mpsc::unbounded_channel();
        Self {
            context,
            observer,
            cards: HashMap::new(),
            container_widths: HashMap::new(),
            visible_tx,
            visible_rx,
            event_tx,
        }
    }

    /// Adds a card and starts observing it.
    pub fn add_card(&mut self, id: ElementId, reference: ImageReference, container_width: u32) {
        self.cards.insert(id, ImageCard::new(reference));
        self.container_widths.insert(id, container_width);

        let tx = self.visible_tx.clone();
        self.observer.observe(id, move |element| {
            let _ = tx.send(element);
        });
    }

    /// Removes a card. An in-flight load still completes but is ignored.
    pub fn remove_card(&mut self, id: ElementId) {
        self.observer.unobserve(id);
        self.cards.remove(&id);
        self.container_widths.remove(&id);
    }

    /// Returns a card.
    #[must_use]
    pub fn card(&self, id: ElementId) -> Option<&ImageCard> {
        self.cards.get(&id)
    }

    /// Evaluates visibility and starts loads for newly visible cards.
    ///
    /// Returns the ids whose loads were started.
    pub fn on_scroll(&mut self, viewport: Viewport, layouts: &[ElementLayout]) -> Vec<ElementId> {
        self.observer.process(viewport, layouts);

        let mut started = Vec::new();
        while let Ok(id) = self.visible_rx.try_recv() {
            let Some(width) = self.container_widths.get(&id).copied() else {
                continue;
            };
            let Some(card) = self.cards.get_mut(&id) else {
                continue;
            };
            let target = self.context.resolve(card.reference(), width);
            if let Some(url) = card.on_visible(target) {
                trace!(element = %id, url = %url, "Card became visible");
                self.context
                    .loader()
                    .load_async(id, url, self.event_tx.clone());
                started.push(id);
            }
        }
        started
    }

    /// Handles a container resize, reloading at the new resolution if needed.
    pub fn on_resize(&mut self, id: ElementId, container_width: u32) -> bool {
        let Some(card) = self.cards.get_mut(&id) else {
            return false;
        };
        self.container_widths.insert(id, container_width);

        let target = self.context.resolve(card.reference(), container_width);
        match card.on_resize(target) {
            Some(url) => {
                debug!(element = %id, url = %url, "Reloading card after resize");
                self.context
                    .loader()
                    .load_async(id, url, self.event_tx.clone());
                true
            }
            None => false,
        }
    }

    /// Applies a finished load to its card.
    pub fn on_image_event(&mut self, event: ImageLoadedEvent) {
        let Some(card) = self.cards.get_mut(&event.element) else {
            return;
        };
        match event.result {
            Ok(loaded) => {
                card.on_loaded(loaded.entry);
            }
            Err(e) => {
                card.on_error(&event.url, e.to_string());
            }
        }
    }

    /// Number of cards still waiting to become visible.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        match &self.observer {
            ObserverHandle::Active(scheduler) => scheduler.observed_count(),
            ObserverHandle::Noop => self.cards.len(),
        }
    }
}
