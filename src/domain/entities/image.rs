//! Domain types for gallery images.

use serde::{Deserialize, Serialize};

/// A logical image supplied by the gallery data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Direct URL or local `/images/...` path.
    pub url: String,
    /// Public id on the Cloudinary-style CDN, when the image lives there.
    #[serde(default)]
    pub cloudinary_id: Option<String>,
    /// Intrinsic width if known.
    #[serde(default)]
    pub width: Option<u32>,
    /// Intrinsic height if known.
    #[serde(default)]
    pub height: Option<u32>,
    /// Caption or person name shown with the image.
    #[serde(default)]
    pub name: Option<String>,
}

impl ImageReference {
    /// Creates a reference to a plain URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cloudinary_id: None,
            width: None,
            height: None,
            name: None,
        }
    }

    /// Sets the CDN public id.
    #[must_use]
    pub fn with_cloudinary_id(mut self, id: impl Into<String>) -> Self {
        self.cloudinary_id = Some(id.into());
        self
    }

    /// Sets the intrinsic dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Target size and quality chosen for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSizeDecision {
    /// Target pixel width, always a positive multiple of the rounding step.
    pub width: u32,
    /// Encoder quality, 1-100.
    pub quality: u8,
}

/// Named width breakpoints for responsive variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// 300px.
    Thumbnail,
    /// 480px.
    Small,
    /// 768px.
    Medium,
    /// 1024px.
    Large,
    /// 1920px.
    Xlarge,
}

impl Breakpoint {
    /// All breakpoints, narrowest first.
    pub const ALL: [Self; 5] = [
        Self::Thumbnail,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Xlarge,
    ];

    /// Pixel width of the breakpoint.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            Self::Thumbnail => 300,
            Self::Small => 480,
            Self::Medium => 768,
            Self::Large => 1024,
            Self::Xlarge => 1920,
        }
    }

    /// Lowercase name used as a key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The five URLs of one image, keyed by breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveVariantSet {
    /// 300px variant.
    pub thumbnail: String,
    /// 480px variant.
    pub small: String,
    /// 768px variant.
    pub medium: String,
    /// 1024px variant.
    pub large: String,
    /// 1920px variant.
    pub xlarge: String,
}

impl ResponsiveVariantSet {
    /// Builds a set by calling `url_for` once per breakpoint.
    pub fn from_fn(mut url_for: impl FnMut(Breakpoint) -> String) -> Self {
        Self {
            thumbnail: url_for(Breakpoint::Thumbnail),
            small: url_for(Breakpoint::Small),
            medium: url_for(Breakpoint::Medium),
            large: url_for(Breakpoint::Large),
            xlarge: url_for(Breakpoint::Xlarge),
        }
    }

    /// Returns the URL for a breakpoint.
    #[must_use]
    pub fn get(&self, breakpoint: Breakpoint) -> &str {
        match breakpoint {
            Breakpoint::Thumbnail => &self.thumbnail,
            Breakpoint::Small => &self.small,
            Breakpoint::Medium => &self.medium,
            Breakpoint::Large => &self.large,
            Breakpoint::Xlarge => &self.xlarge,
        }
    }

    /// Iterates `(breakpoint, url)` pairs, narrowest first.
    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, &str)> {
        Breakpoint::ALL.into_iter().map(|bp| (bp, self.get(bp)))
    }

    /// Picks the narrowest variant at least `width` wide, or the widest one.
    #[must_use]
    pub fn for_width(&self, width: u32) -> (Breakpoint, &str) {
        let breakpoint = Breakpoint::ALL
            .into_iter()
            .find(|bp| bp.width() >= width)
            .unwrap_or(Breakpoint::Xlarge);
        (breakpoint, self.get(breakpoint))
    }
}

/// Dimensions of an image that finished loading, keyed by resolved URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Resolved source URL.
    pub src: String,
    /// Decoded width.
    pub width: u32,
    /// Decoded height.
    pub height: u32,
}

/// Status of an image in the loading pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Not yet visible, nothing requested.
    #[default]
    NotStarted,
    /// Fetch in flight.
    Loading,
    /// Loaded and ready for display.
    Ready,
    /// Loading failed; not retried.
    Failed(String),
}

impl ImageStatus {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the image is currently being loaded.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
