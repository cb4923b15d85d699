//! Conversions between `image` buffers and `tiny-skia` pixmaps.
//!
//! `RgbaImage` stores straight (non-premultiplied) alpha while
//! `Pixmap` stores premultiplied alpha, so both directions convert
//! per pixel. All compositing happens on pixmaps; results are handed
//! back to callers as `RgbaImage`.

use crate::types::{CaptureError, RgbaImage};

/// Allocate a transparent pixmap of the given size.
///
/// # Errors
///
/// Returns [`CaptureError::Surface`] if either dimension is zero or
/// the allocation would overflow.
pub fn new_pixmap(width: u32, height: u32) -> Result<tiny_skia::Pixmap, CaptureError> {
    tiny_skia::Pixmap::new(width, height).ok_or(CaptureError::Surface { width, height })
}

/// Convert a straight-alpha `RgbaImage` into a premultiplied pixmap.
///
/// # Errors
///
/// Returns [`CaptureError::Surface`] if the image has a zero dimension.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Result<tiny_skia::Pixmap, CaptureError> {
    let (width, height) = image.dimensions();
    let surface_err = CaptureError::Surface { width, height };

    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        data.push(premultiply(r, a));
        data.push(premultiply(g, a));
        data.push(premultiply(b, a));
        data.push(a);
    }

    let size = tiny_skia::IntSize::from_wh(width, height).ok_or(surface_err)?;
    tiny_skia::Pixmap::from_vec(data, size).ok_or(CaptureError::Surface { width, height })
}

/// Convert a premultiplied pixmap back into a straight-alpha
/// `RgbaImage`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rgba_from_pixmap(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = image::Rgba([0, 0, 0, 0]);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = image::Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}

/// Premultiply one channel by alpha with rounding.
#[allow(clippy::cast_possible_truncation)]
const fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}
