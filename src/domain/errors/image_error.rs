//! Image loading error types.

use thiserror::Error;

/// Result type for image pipeline operations.
pub type ImageResult<T> = std::result::Result<T, ImageError>;

/// Image loading error variants.
///
/// Failures stay local to the image that produced them and are never retried.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ImageError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to decode image: {message}")]
    Decode { message: String },

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl ImageError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::Timeout { .. }
        )
    }
}
