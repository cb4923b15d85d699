//! The visible image: the source scaled to fit the viewport.
//!
//! The source image is resized to fit the viewport while preserving
//! aspect ratio, then placed centered. All stroke clamping, magnifier
//! sampling, and extraction operate against this scaled copy; the
//! session caches it and rebuilds only when the source image or the
//! viewport size changes.

use crate::types::{CaptureError, Dimensions, PixelRect, RgbaImage};

/// A source image scaled to fit a viewport, with its centered
/// placement rectangle.
#[derive(Debug, Clone)]
pub struct VisibleImage {
    image: RgbaImage,
    rect: PixelRect,
}

impl VisibleImage {
    /// Scale `source` to fit `viewport` while preserving aspect ratio
    /// and center it.
    ///
    /// Uses bilinear (triangle) resampling; an image already at the
    /// fitted size is copied without resampling.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Surface`] if the source or the viewport
    /// has a zero dimension.
    pub fn fit(source: &RgbaImage, viewport: Dimensions) -> Result<Self, CaptureError> {
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(CaptureError::Surface {
                width: src_w,
                height: src_h,
            });
        }
        if viewport.width == 0 || viewport.height == 0 {
            return Err(CaptureError::Surface {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let scale = (f64::from(viewport.width) / f64::from(src_w))
            .min(f64::from(viewport.height) / f64::from(src_h));

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fit_w = ((f64::from(src_w) * scale).round() as u32).clamp(1, viewport.width);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fit_h = ((f64::from(src_h) * scale).round() as u32).clamp(1, viewport.height);

        let image = if (fit_w, fit_h) == (src_w, src_h) {
            source.clone()
        } else {
            image::imageops::resize(source, fit_w, fit_h, image::imageops::FilterType::Triangle)
        };

        let rect = PixelRect::centered_in(Dimensions::new(fit_w, fit_h), viewport);
        Ok(Self { image, rect })
    }

    /// The scaled pixel buffer.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Centered placement rectangle in viewport coordinates.
    #[must_use]
    pub const fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Dimensions of the scaled image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let (w, h) = self.image.dimensions();
        Dimensions::new(w, h)
    }
}
