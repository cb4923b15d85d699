//! Shared types for the kirinuki capture engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference pixel
/// buffers without depending on `image` directly.
pub use image::RgbaImage;

/// A pointer sample in viewport-pixel coordinates.
///
/// An ordered sequence of samples forms the raw stroke of one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Horizontal position (pixels from the viewport's left edge).
    pub x: f64,
    /// Vertical position (pixels from the viewport's top edge).
    pub y: f64,
}

impl Sample {
    /// Create a new sample.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another sample.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another sample.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Euclidean distance truncated to a whole pixel count.
    ///
    /// Closure validation compares this against the closeness
    /// threshold, so a distance of 99.9 px counts as 99.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn truncated_distance(self, other: Self) -> u32 {
        self.distance(other) as u32
    }
}

/// Pixel dimensions of a viewport or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in viewport-pixel coordinates.
///
/// Used for the centered placement of the visible image within the
/// viewport. Edges are inclusive for clamping purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PixelRect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge (`left + width`).
    #[must_use]
    pub fn right(self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge (`top + height`).
    #[must_use]
    pub fn bottom(self) -> f64 {
        self.top + self.height
    }

    /// Centered placement of `inner` within `outer`:
    /// `origin = (outer - inner) / 2`, floored to whole pixels so the
    /// rectangle lands on the pixel grid.
    #[must_use]
    pub fn centered_in(inner: Dimensions, outer: Dimensions) -> Self {
        let left = ((f64::from(outer.width) - f64::from(inner.width)) / 2.0).floor();
        let top = ((f64::from(outer.height) - f64::from(inner.height)) / 2.0).floor();
        Self::new(left, top, f64::from(inner.width), f64::from(inner.height))
    }
}

/// Configuration for the capture engine.
///
/// All parameters have defaults matching the stock widget behavior and
/// may be overridden by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Side length of the rendered magnifier square, in pixels.
    pub magnifier_size: u32,

    /// Sample-window margin for the magnifier. The window extracted
    /// around the pointer is `2 * magnify_margin` pixels on a side,
    /// and the padded canvas extends the visible image by this amount
    /// in every direction. Must be at least 1.
    pub magnify_margin: u32,

    /// Whether the magnifier inset is composited into preview frames.
    pub magnifier_enabled: bool,

    /// Closeness threshold in viewport pixels. A stroke whose final
    /// sample is at least this far from its first sample is rejected.
    pub close_distance: u32,

    /// Minimum number of samples a stroke needs to form a region.
    pub min_samples: usize,

    /// Stroke width of the dashed path overlay in preview frames.
    pub overlay_stroke_width: f32,

    /// Dash pattern (on, off) of the path overlay in preview frames.
    pub overlay_dash: [f32; 2],

    /// Stroke width of the path drawn inside the magnifier window.
    pub magnifier_stroke_width: f32,

    /// Width of the round-joined outline stroked over the mask fill
    /// during extraction, smoothing corners of the traced shape. The
    /// mask extends at most half this width beyond the path geometry.
    pub mask_edge_width: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            magnifier_size: 200,
            magnify_margin: 40,
            magnifier_enabled: true,
            close_distance: 100,
            min_samples: 12,
            overlay_stroke_width: 5.0,
            overlay_dash: [10.0, 20.0],
            magnifier_stroke_width: 3.0,
            mask_edge_width: 2.0,
        }
    }
}

/// Errors that can occur during capture and extraction.
///
/// All variants are recoverable: the session clears the in-progress
/// stroke and returns to `Idle`, ready for the next gesture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The stroke's final sample ended too far from its first sample.
    #[error("stroke must end within {threshold} px of its starting point (ended {distance} px away)")]
    InvalidClosure {
        /// Truncated distance between the first and final samples.
        distance: u32,
        /// Configured closeness threshold.
        threshold: u32,
    },

    /// The stroke has too few samples to form a usable region.
    #[error("stroke needs at least {minimum} samples to form a region (got {got})")]
    InsufficientSamples {
        /// Number of samples recorded.
        got: usize,
        /// Configured minimum sample count.
        minimum: usize,
    },

    /// The closed path encloses no non-background pixels.
    #[error("traced region encloses no pixels")]
    EmptyExtraction,

    /// Extraction or drawing was attempted with no source image set.
    #[error("no source image has been set")]
    MissingSourceImage,

    /// `confirm` was called without a validated stroke awaiting
    /// extraction.
    #[error("no validated stroke is awaiting extraction")]
    NoPendingExtraction,

    /// A raster surface of the given size could not be allocated.
    #[error("cannot allocate a {width}x{height} raster surface")]
    Surface {
        /// Requested surface width.
        width: u32,
        /// Requested surface height.
        height: u32,
    },
}
