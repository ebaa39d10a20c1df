//! Responsive image URL construction.
//!
//! Images hosted on the Cloudinary-style CDN get transformation URLs;
//! everything else gets a `w=` query parameter.

use std::fmt::Write as _;

use crate::domain::entities::{Breakpoint, ImageReference, ImageSizeDecision, ResponsiveVariantSet};

/// Host of the transformation CDN.
pub const CLOUDINARY_HOST: &str = "res.cloudinary.com";

/// Placeholder service used when no image source is available.
pub const PLACEHOLDER_BASE: &str = "https://via.placeholder.com";

/// Builds the CDN URL for a transformation string.
#[must_use]
pub fn cloudinary_url(cloud_name: &str, transform: &str, public_id: &str) -> String {
    format!(
        "https://{CLOUDINARY_HOST}/{cloud_name}/image/upload/{transform}/{}",
        public_id.trim_start_matches('/')
    )
}

/// Appends `key=value` using `&` if `url` already has a query, `?` otherwise.
///
/// Existing parameters with the same key are kept as they are.
#[must_use]
pub fn append_query_param(url: &str, key: &str, value: impl std::fmt::Display) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

/// Generates the five breakpoint variants of an image.
///
/// The CDN scheme is used only when both a public id and a cloud name are
/// present; otherwise the base URL gets a `w=` parameter.
#[must_use]
pub fn generate_responsive_image_urls(
    base_url: &str,
    cloudinary_id: Option<&str>,
    cloud_name: Option<&str>,
) -> ResponsiveVariantSet {
    match (cloudinary_id, cloud_name) {
        (Some(id), Some(cloud)) => ResponsiveVariantSet::from_fn(|bp| {
            cloudinary_url(cloud, &format!("w_{},c_limit,q_auto", bp.width()), id)
        }),
        _ => ResponsiveVariantSet::from_fn(|bp| append_query_param(base_url, "w", bp.width())),
    }
}

/// Variants for a reference.
#[must_use]
pub fn variants_for(reference: &ImageReference, cloud_name: Option<&str>) -> ResponsiveVariantSet {
    generate_responsive_image_urls(
        &reference.url,
        reference.cloudinary_id.as_deref(),
        cloud_name,
    )
}

/// Builds a URL for an exact size decision.
#[must_use]
pub fn optimized_image_url(
    reference: &ImageReference,
    decision: ImageSizeDecision,
    cloud_name: Option<&str>,
) -> String {
    match (reference.cloudinary_id.as_deref(), cloud_name) {
        (Some(id), Some(cloud)) => cloudinary_url(
            cloud,
            &format!("w_{},q_{},c_limit,f_auto", decision.width, decision.quality),
            id,
        ),
        _ => append_query_param(
            &append_query_param(&reference.url, "w", decision.width),
            "q",
            decision.quality,
        ),
    }
}

/// Returns the breakpoint variant that best covers `decision`.
#[must_use]
pub fn variant_url_for(
    reference: &ImageReference,
    decision: ImageSizeDecision,
    cloud_name: Option<&str>,
) -> (Breakpoint, String) {
    let variants = variants_for(reference, cloud_name);
    let (breakpoint, url) = variants.for_width(decision.width);
    (breakpoint, url.to_string())
}

/// Builds a placeholder URL labelled with `text`.
#[must_use]
pub fn placeholder_url(width: u32, height: u32, text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            b' ' => encoded.push('+'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    format!("{PLACEHOLDER_BASE}/{width}x{height}?text={encoded}")
}

/// Checks if a URL points at the transformation CDN.
#[must_use]
pub fn is_cloudinary_url(url: &str) -> bool {
    url.contains(CLOUDINARY_HOST)
}

/// Extracts the public id from a CDN upload URL, skipping the
/// transformation segment and version if present.
#[must_use]
pub fn extract_cloudinary_id(url: &str) -> Option<String> {
    if !is_cloudinary_url(url) {
        return None;
    }

    let path = url.split("/image/upload/").nth(1)?;
    let path = path.split('?').next()?;
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // transformation segments look like "w_300,c_limit"; versions like "v1712345"
    while segments.len() > 1 {
        let first = segments[0];
        let is_transform = first.split(',').all(|part| {
            part.split_once('_').is_some_and(|(key, _)| {
                (1..=3).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_lowercase())
            })
        });
        let is_version =
            first.len() > 1 && first.starts_with('v') && first[1..].bytes().all(|b| b.is_ascii_digit());
        if is_transform || is_version {
            segments.remove(0);
        } else {
            break;
        }
    }

    (!segments.is_empty()).then(|| segments.join("/"))
}
