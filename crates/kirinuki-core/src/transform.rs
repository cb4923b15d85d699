//! Coordinate transforms between viewport space and image-local space.
//!
//! Pointer samples arrive in viewport coordinates, but the magnifier
//! and extraction composite in the visible image's own pixel space.
//! Clamping every incoming sample to the visible image's centered
//! placement rectangle guarantees downstream code never indexes
//! outside the image buffer.

use crate::types::{PixelRect, Sample};

/// Clamp a viewport-space sample to the visible image's placement
/// rectangle.
///
/// `x` is clamped to `[rect.left, rect.right()]` and `y` to
/// `[rect.top, rect.bottom()]`. Idempotent: clamping twice yields the
/// same result as once.
#[must_use]
pub fn clamp_to_visible(sample: Sample, rect: PixelRect) -> Sample {
    Sample::new(
        sample.x.clamp(rect.left, rect.right()),
        sample.y.clamp(rect.top, rect.bottom()),
    )
}

/// Convert an (already clamped) viewport-space sample to image-local
/// space by subtracting the placement rectangle's origin.
#[must_use]
pub fn to_image_local(sample: Sample, rect: PixelRect) -> Sample {
    Sample::new(sample.x - rect.left, sample.y - rect.top)
}
