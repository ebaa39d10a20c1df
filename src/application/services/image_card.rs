//! Loading state of a single gallery card.
//!
//! A card starts idle, begins loading the first time it becomes visible,
//! may switch to another resolution when its container is resized, and ends
//! ready or failed. Failures are final.

use crate::domain::entities::{CacheEntry, ImageReference, ImageSizeDecision, ImageStatus};
use crate::infrastructure::image::placeholder_url;

/// Label shown on the generic placeholder.
pub const UNAVAILABLE_LABEL: &str = "Image unavailable";

const PLACEHOLDER_SIZE: (u32, u32) = (400, 300);

/// A decision together with the URL it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Chosen size and quality.
    pub decision: ImageSizeDecision,
    /// URL to fetch.
    pub url: String,
}

/// What to show when the image itself cannot be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFallback {
    /// Initials derived from the card's name.
    Initials(String),
    /// Generic "unavailable" placeholder image.
    Unavailable {
        /// Placeholder URL sized like the card.
        placeholder: String,
    },
}

/// Per-card loading state machine.
#[derive(Debug, Clone)]
pub struct ImageCard {
    reference: ImageReference,
    status: ImageStatus,
    current: Option<ResolvedImage>,
    loaded: Option<CacheEntry>,
}

impl ImageCard {
    /// Creates an idle card.
    #[must_use]
    pub fn new(reference: ImageReference) -> Self {
        Self {
            reference,
            status: ImageStatus::NotStarted,
            current: None,
            loaded: None,
        }
    }

    /// The image this card displays.
    #[must_use]
    pub const fn reference(&self) -> &ImageReference {
        &self.reference
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &ImageStatus {
        &self.status
    }

    /// Target currently requested, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&ResolvedImage> {
        self.current.as_ref()
    }

    /// Entry of the last successful load.
    #[must_use]
    pub const fn loaded(&self) -> Option<&CacheEntry> {
        self.loaded.as_ref()
    }

    /// Called when the card first intersects the viewport.
    ///
    /// Returns the URL to fetch the first time only.
    pub fn on_visible(&mut self, target: ResolvedImage) -> Option<String> {
        if self.status != ImageStatus::NotStarted {
            return None;
        }
        self.status = ImageStatus::Loading;
        let url = target.url.clone();
        self.current = Some(target);
        Some(url)
    }

    /// Called when the container is resized.
    ///
    /// Returns a URL to fetch when the target width changed on a card that
    /// has already been triggered and has not failed.
    pub fn on_resize(&mut self, target: ResolvedImage) -> Option<String> {
        if matches!(self.status, ImageStatus::NotStarted | ImageStatus::Failed(_)) {
            return None;
        }
        let changed = self
            .current
            .as_ref()
            .is_none_or(|current| current.decision.width != target.decision.width);
        if !changed {
            return None;
        }
        self.status = ImageStatus::Loading;
        let url = target.url.clone();
        self.current = Some(target);
        Some(url)
    }

    /// Records a finished load. Loads for superseded URLs are ignored.
    pub fn on_loaded(&mut self, entry: CacheEntry) -> bool {
        if !self.is_current(&entry.src) {
            return false;
        }
        self.status = ImageStatus::Ready;
        self.loaded = Some(entry);
        true
    }

    /// Records a failed load. Loads for superseded URLs are ignored.
    pub fn on_error(&mut self, url: &str, message: impl Into<String>) -> bool {
        if !self.is_current(url) {
            return false;
        }
        self.status = ImageStatus::Failed(message.into());
        true
    }

    /// Fallback to render while failed.
    #[must_use]
    pub fn fallback(&self) -> Option<CardFallback> {
        if !self.status.is_failed() {
            return None;
        }
        let initials = self
            .reference
            .name
            .as_deref()
            .map(fallback_initials)
            .filter(|initials| !initials.is_empty());
        Some(initials.map_or_else(
            || {
                let (width, height) = self.placeholder_size();
                CardFallback::Unavailable {
                    placeholder: placeholder_url(width, height, UNAVAILABLE_LABEL),
                }
            },
            CardFallback::Initials,
        ))
    }

    /// Known dimensions of the image, else the last requested width at 4:3.
    fn placeholder_size(&self) -> (u32, u32) {
        match (self.reference.width, self.reference.height) {
            (Some(width), Some(height)) => (width, height),
            _ => self.current.as_ref().map_or(PLACEHOLDER_SIZE, |c| {
                (c.decision.width, c.decision.width * 3 / 4)
            }),
        }
    }

    fn is_current(&self, url: &str) -> bool {
        self.current.as_ref().is_some_and(|c| c.url == url)
    }
}

/// Up to two uppercase initials from a name.
#[must_use]
pub fn fallback_initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_alphanumeric())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
