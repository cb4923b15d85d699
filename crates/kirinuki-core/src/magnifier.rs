//! Magnifier compositor: a zoomed snapshot of the image and path
//! around the most recent pointer sample.
//!
//! A fingertip obscures the exact pixel being targeted, so each
//! pointer event renders a square window around the sample at high
//! zoom. The visible image is composited onto a black-backed canvas
//! padded by the sample-window margin so windows requested at the
//! image edge still have full content to sample from.

use crate::path;
use crate::raster;
use crate::transform;
use crate::types::{CaptureConfig, CaptureError, RgbaImage, Sample};
use crate::visible::VisibleImage;

/// Render the magnifier buffer for the most recent sample.
///
/// Returns a `magnifier_size x magnifier_size` buffer showing a
/// `2 * magnify_margin` square window centered on `last_sample`,
/// upscaled with nearest-neighbor sampling. The current stroke is
/// drawn over the window content; the host composites its own
/// crosshair and placement decorations.
///
/// # Errors
///
/// Returns [`CaptureError::Surface`] if the configured magnifier size
/// or margin is zero, or if the padded canvas cannot be allocated.
pub fn render_magnifier(
    last_sample: Sample,
    samples: &[Sample],
    visible: &VisibleImage,
    config: &CaptureConfig,
) -> Result<RgbaImage, CaptureError> {
    let margin = config.magnify_margin;
    let window = margin.saturating_mul(2);
    if window == 0 || config.magnifier_size == 0 {
        return Err(CaptureError::Surface {
            width: config.magnifier_size,
            height: window,
        });
    }

    let rect = visible.rect();
    let local = transform::to_image_local(transform::clamp_to_visible(last_sample, rect), rect);

    // Padded canvas: visible image centered on an opaque black field
    // extending `margin` pixels in every direction.
    let dims = visible.dimensions();
    let (Some(padded_width), Some(padded_height)) = (
        dims.width.checked_add(window),
        dims.height.checked_add(window),
    ) else {
        return Err(CaptureError::Surface {
            width: dims.width.saturating_add(window),
            height: dims.height.saturating_add(window),
        });
    };
    let mut canvas = raster::new_pixmap(padded_width, padded_height)?;
    canvas.fill(tiny_skia::Color::BLACK);

    let image_pixmap = raster::pixmap_from_rgba(visible.image())?;
    #[allow(clippy::cast_possible_wrap)]
    canvas.draw_pixmap(
        margin as i32,
        margin as i32,
        image_pixmap.as_ref(),
        &tiny_skia::PixmapPaint::default(),
        tiny_skia::Transform::identity(),
        None,
    );

    // Stroke path shifted into padded image-local coordinates.
    let segments = path::smooth_path(samples, 1);
    if segments.len() >= 2
        && let Some(skia_path) = path::to_skia_path(
            &segments,
            f64::from(margin) - rect.left,
            f64::from(margin) - rect.top,
            false,
        )
    {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = true;
        let stroke = tiny_skia::Stroke {
            width: config.magnifier_stroke_width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        canvas.stroke_path(
            &skia_path,
            &paint,
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    // The window's top-left in padded coordinates equals the local
    // sample position, so the (shifted) sample sits at its center.
    // In bounds by construction since the sample was clamped.
    #[allow(clippy::cast_possible_truncation)]
    let window_rect =
        tiny_skia::IntRect::from_xywh(local.x.round() as i32, local.y.round() as i32, window, window)
            .ok_or(CaptureError::Surface {
                width: window,
                height: window,
            })?;
    let part = canvas.clone_rect(window_rect).ok_or(CaptureError::Surface {
        width: window,
        height: window,
    })?;

    let part_rgba = raster::rgba_from_pixmap(&part);
    Ok(image::imageops::resize(
        &part_rgba,
        config.magnifier_size,
        config.magnifier_size,
        image::imageops::FilterType::Nearest,
    ))
}
