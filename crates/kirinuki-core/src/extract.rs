//! Extraction engine: mask the visible image with the closed path and
//! trim to the tight bounding box of non-background pixels.
//!
//! The closed stroke is filled as an anti-aliased opaque mask, the
//! visible image is composited over it with source-in blending (the
//! image contributes color only where the mask is opaque), and the
//! result is cut down to the smallest rectangle containing any
//! non-transparent pixel.

use crate::path;
use crate::raster;
use crate::types::{CaptureConfig, CaptureError, Dimensions, PixelRect, RgbaImage, Sample};
use crate::visible::VisibleImage;

/// Color the mask interior is filled with before the source-in
/// composite replaces it. Any opaque value works; white keeps partial
/// anti-aliased edges neutral.
const MASK_FILL: tiny_skia::Color = tiny_skia::Color::WHITE;

/// Extract the region enclosed by the (validated, closed) stroke.
///
/// Returns the enclosed pixels of the visible image on a transparent
/// background, cropped to the tight bounding box of the traced shape.
///
/// # Errors
///
/// Returns [`CaptureError::EmptyExtraction`] if the path encloses no
/// pixels, and [`CaptureError::Surface`] if the viewport-sized work
/// buffer cannot be allocated.
pub fn extract(
    samples: &[Sample],
    visible: &VisibleImage,
    viewport: Dimensions,
    config: &CaptureConfig,
) -> Result<RgbaImage, CaptureError> {
    // Full-resolution path: every sample participates (stride 1).
    let segments = path::smooth_path(samples, 1);
    let Some(outline) = path::to_skia_path(&segments, 0.0, 0.0, true) else {
        return Err(CaptureError::EmptyExtraction);
    };

    let mut canvas = raster::new_pixmap(viewport.width, viewport.height)?;

    // 1. Fill the closed outline as an opaque anti-aliased mask.
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(MASK_FILL);
    paint.anti_alias = true;
    canvas.fill_path(
        &outline,
        &paint,
        tiny_skia::FillRule::Winding,
        tiny_skia::Transform::identity(),
        None,
    );

    // 2. Round the mask boundary: a thin round-joined stroke over the
    // outline smooths corners the way the stock widget's corner path
    // effect did. A degenerate outline (coincident or collinear
    // samples) encloses nothing; stroking it would turn the empty fill
    // into a stray dot or line, so it is left untouched and falls out
    // as an empty extraction below.
    let bounds = outline.bounds();
    if config.mask_edge_width > 0.0 && bounds.width() >= 1.0 && bounds.height() >= 1.0 {
        let stroke = tiny_skia::Stroke {
            width: config.mask_edge_width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        canvas.stroke_path(
            &outline,
            &paint,
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    // 3. Source-in composite: the visible image contributes color only
    // where the mask is opaque.
    let rect = visible.rect();
    let image_pixmap = raster::pixmap_from_rgba(visible.image())?;
    #[allow(clippy::cast_possible_truncation)]
    canvas.draw_pixmap(
        rect.left as i32,
        rect.top as i32,
        image_pixmap.as_ref(),
        &tiny_skia::PixmapPaint {
            blend_mode: tiny_skia::BlendMode::SourceIn,
            ..tiny_skia::PixmapPaint::default()
        },
        tiny_skia::Transform::identity(),
        None,
    );

    // The source-in draw only touches the image's own rectangle; mask
    // spill outside it (edge-clamped strokes) must not survive as the
    // bare fill color.
    clear_outside(&mut canvas, rect);

    let composed = raster::rgba_from_pixmap(&canvas);
    trim_to_content(&composed)
}

/// Trim an image to the tight bounding box of its non-transparent
/// pixels.
///
/// Four independent scans locate the first and last rows and columns
/// containing any pixel that is not fully transparent. Idempotent on
/// already-trimmed images.
///
/// # Errors
///
/// Returns [`CaptureError::EmptyExtraction`] if every pixel is fully
/// transparent.
pub fn trim_to_content(image: &RgbaImage) -> Result<RgbaImage, CaptureError> {
    const BACKGROUND: image::Rgba<u8> = image::Rgba([0, 0, 0, 0]);
    let (width, height) = image.dimensions();

    let is_content = |x: u32, y: u32| *image.get_pixel(x, y) != BACKGROUND;

    let top = (0..height)
        .find(|&y| (0..width).any(|x| is_content(x, y)))
        .ok_or(CaptureError::EmptyExtraction)?;
    let bottom = (top..height)
        .rev()
        .find(|&y| (0..width).any(|x| is_content(x, y)))
        .ok_or(CaptureError::EmptyExtraction)?;
    let left = (0..width)
        .find(|&x| (top..=bottom).any(|y| is_content(x, y)))
        .ok_or(CaptureError::EmptyExtraction)?;
    let right = (left..width)
        .rev()
        .find(|&x| (top..=bottom).any(|y| is_content(x, y)))
        .ok_or(CaptureError::EmptyExtraction)?;

    Ok(
        image::imageops::crop_imm(image, left, top, right - left + 1, bottom - top + 1)
            .to_image(),
    )
}

/// Zero out every pixel outside the given rectangle.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clear_outside(pixmap: &mut tiny_skia::Pixmap, rect: PixelRect) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let x0 = rect.left.max(0.0).floor() as usize;
    let y0 = rect.top.max(0.0).floor() as usize;
    let x1 = (rect.right().max(0.0).ceil() as usize).min(width);
    let y1 = (rect.bottom().max(0.0).ceil() as usize).min(height);

    let data = pixmap.data_mut();
    for y in 0..height {
        let row = y * width * 4;
        if y < y0 || y >= y1 {
            data[row..row + width * 4].fill(0);
        } else {
            data[row..row + x0 * 4].fill(0);
            data[row + x1 * 4..row + width * 4].fill(0);
        }
    }
}
