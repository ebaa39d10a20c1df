//! Target size and quality selection for a container.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{DeviceCapabilities, ImageSizeDecision};

/// Thresholds used by [`SizePolicy::optimal_image_size`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePolicy {
    /// Width cap for low-memory devices and slow connections.
    #[serde(default = "default_constrained_max_width")]
    pub constrained_max_width: u32,
    /// Widths are rounded up to a multiple of this.
    #[serde(default = "default_rounding_step")]
    pub rounding_step: u32,
    /// Quality for constrained devices.
    #[serde(default = "default_constrained_quality")]
    pub constrained_quality: u8,
    /// Quality for pixel ratios strictly above 2.
    #[serde(default = "default_high_dpr_quality")]
    pub high_dpr_quality: u8,
    /// Quality otherwise.
    #[serde(default = "default_quality")]
    pub default_quality: u8,
}

fn default_constrained_max_width() -> u32 {
    800
}

fn default_rounding_step() -> u32 {
    100
}

fn default_constrained_quality() -> u8 {
    65
}

fn default_high_dpr_quality() -> u8 {
    80
}

fn default_quality() -> u8 {
    85
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            constrained_max_width: default_constrained_max_width(),
            rounding_step: default_rounding_step(),
            constrained_quality: default_constrained_quality(),
            high_dpr_quality: default_high_dpr_quality(),
            default_quality: default_quality(),
        }
    }
}

impl SizePolicy {
    /// Picks the pixel width and quality for a container.
    ///
    /// The constrained cap takes precedence over the high-DPI quality bump,
    /// and a pixel ratio of exactly 2 keeps the default quality.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn optimal_image_size(
        &self,
        container_width: u32,
        caps: &DeviceCapabilities,
    ) -> ImageSizeDecision {
        let step = self.rounding_step.max(1);
        let constrained = caps.is_constrained();

        let scaled = (f64::from(container_width) * caps.device_pixel_ratio)
            .round()
            .clamp(0.0, f64::from(u32::MAX - step)) as u32;
        let capped = if constrained {
            scaled.min(self.constrained_max_width)
        } else {
            scaled
        };
        let width = capped.div_ceil(step).max(1) * step;

        let quality = if constrained {
            self.constrained_quality
        } else if caps.device_pixel_ratio > 2.0 {
            self.high_dpr_quality
        } else {
            self.default_quality
        };

        ImageSizeDecision { width, quality }
    }
}

/// Applies the default policy.
#[must_use]
pub fn optimal_image_size(container_width: u32, caps: &DeviceCapabilities) -> ImageSizeDecision {
    SizePolicy::default().optimal_image_size(container_width, caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn caps(dpr: f64, low_memory: bool, slow: bool) -> DeviceCapabilities {
        DeviceCapabilities {
            device_pixel_ratio: dpr,
            is_low_memory_device: low_memory,
            is_slow_connection: slow,
            ..DeviceCapabilities::server_default()
        }
    }

    #[test_case(1200, 2.0, false, false, 2400, 85 ; "dpr_two_keeps_default_quality")]
    #[test_case(1200, 3.0, false, false, 3600, 80 ; "high_dpr")]
    #[test_case(1200, 3.0, true, false, 800, 65 ; "low_memory_caps_width")]
    #[test_case(1200, 1.0, false, true, 800, 65 ; "slow_connection_caps_width")]
    #[test_case(350, 1.0, false, false, 400, 85 ; "rounds_up")]
    #[test_case(375, 1.5, true, false, 600, 65 ; "constrained_under_cap")]
    #[test_case(300, 1.0, false, false, 300, 85 ; "already_multiple")]
    #[test_case(0, 1.0, false, false, 100, 85 ; "zero_width")]
    fn test_optimal_image_size(
        container: u32,
        dpr: f64,
        low_memory: bool,
        slow: bool,
        width: u32,
        quality: u8,
    ) {
        let decision = optimal_image_size(container, &caps(dpr, low_memory, slow));
        assert_eq!(decision, ImageSizeDecision { width, quality });
    }

    #[test]
    fn test_width_is_positive_multiple_of_100() {
        for container in [1, 99, 101, 333, 768, 1024, 1999] {
            for dpr in [1.0, 1.5, 2.0, 2.625, 3.0] {
                for constrained in [false, true] {
                    let c = caps(dpr, constrained, false);
                    let decision = optimal_image_size(container, &c);

                    assert!(decision.width > 0);
                    assert_eq!(decision.width % 100, 0);
                    if constrained {
                        assert!(decision.width <= 800);
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = SizePolicy {
            constrained_max_width: 640,
            rounding_step: 64,
            ..SizePolicy::default()
        };

        let decision = policy.optimal_image_size(1000, &caps(1.0, true, false));
        assert_eq!(decision.width, 640);
    }
}
