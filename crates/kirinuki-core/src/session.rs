//! Stroke state machine: pointer-event lifecycle for one capture
//! gesture.
//!
//! Pointer samples flow into a [`CaptureSession`], which clamps them
//! to the visible image, grows the stroke, and requests a preview
//! redraw per event. Releasing the pointer validates closure (the
//! final sample must land near the first, and the stroke must carry
//! enough samples); a validated stroke waits in the `Closed` phase for
//! the host's confirmation dialog, which resolves it through
//! [`CaptureSession::confirm`] or [`CaptureSession::discard`]. Every
//! outcome, accepted or not, resets the session to `Idle` for the next
//! attempt.

use serde::{Deserialize, Serialize};

use crate::extract;
use crate::magnifier;
use crate::path;
use crate::raster;
use crate::transform;
use crate::types::{CaptureConfig, CaptureError, Dimensions, RgbaImage, Sample};
use crate::visible::VisibleImage;

/// Background fill of preview frames when no source image is set. The
/// host draws its "set an image first" notice over this.
const PLACEHOLDER_FILL: [u8; 4] = [245, 245, 245, 255];

/// Lifecycle phase of the in-progress stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokePhase {
    /// No samples recorded.
    Idle,
    /// Samples are being appended.
    Active,
    /// Closure validated; awaiting confirm or discard.
    Closed,
}

/// Pointer event phase, as delivered by the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Pointer made contact.
    Down,
    /// Pointer moved while in contact.
    Move,
    /// Pointer lifted.
    Up,
    /// Gesture cancelled by the host; handled identically to `Up`.
    Cancel,
}

/// One pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event phase.
    pub phase: PointerPhase,
    /// Pointer position in viewport pixels.
    pub position: Sample,
}

/// What a pointer event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// The event was ignored (no source image, or a release with no
    /// stroke in progress).
    Ignored,
    /// The sample was appended and a redraw was requested.
    StrokeExtended,
    /// Closure validated; the stroke awaits [`CaptureSession::confirm`]
    /// or [`CaptureSession::discard`].
    ClosureReady,
}

/// Owned state for one freehand capture surface.
///
/// Single-threaded and event-driven: each pointer event synchronously
/// updates the stroke and flags exactly one redraw request, which the
/// host's display loop may coalesce. The scaled visible image is the
/// only cached state; it is invalidated whenever the source image or
/// viewport changes and lazily rebuilt before the next draw.
#[derive(Debug)]
pub struct CaptureSession {
    config: CaptureConfig,
    viewport: Dimensions,
    source: Option<RgbaImage>,
    visible: Option<VisibleImage>,
    stroke: Vec<Sample>,
    phase: StrokePhase,
    redraw_requested: bool,
}

impl CaptureSession {
    /// Create a session for a viewport of the given size, with no
    /// source image yet.
    #[must_use]
    pub const fn new(config: CaptureConfig, viewport: Dimensions) -> Self {
        Self {
            config,
            viewport,
            source: None,
            visible: None,
            stroke: Vec::new(),
            phase: StrokePhase::Idle,
            redraw_requested: true,
        }
    }

    /// Set or replace the source image.
    ///
    /// Invalidates the cached visible image, discards any in-progress
    /// stroke, and requests a redraw.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.source = Some(image);
        self.visible = None;
        self.reset();
    }

    /// Resize the viewport, invalidating the cached visible image and
    /// any in-progress stroke.
    pub fn set_viewport(&mut self, viewport: Dimensions) {
        self.viewport = viewport;
        self.visible = None;
        self.reset();
    }

    /// Whether a source image has been set.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Current stroke phase.
    #[must_use]
    pub const fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// The recorded stroke samples, clamped to the visible image.
    #[must_use]
    pub fn stroke(&self) -> &[Sample] {
        &self.stroke
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Consume the pending redraw request, if any.
    ///
    /// The host polls this after delivering events and schedules a
    /// frame when it returns `true`.
    pub const fn take_redraw_request(&mut self) -> bool {
        std::mem::replace(&mut self.redraw_requested, false)
    }

    /// The visible image for the current source and viewport, built
    /// lazily and cached until either changes.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::MissingSourceImage`] if no image is set,
    /// or [`CaptureError::Surface`] if the viewport is degenerate.
    pub fn visible_image(&mut self) -> Result<&VisibleImage, CaptureError> {
        if self.visible.is_none() {
            let source = self
                .source
                .as_ref()
                .ok_or(CaptureError::MissingSourceImage)?;
            self.visible = Some(VisibleImage::fit(source, self.viewport)?);
        }
        // The cache was just populated above.
        self.visible
            .as_ref()
            .ok_or(CaptureError::MissingSourceImage)
    }

    /// Feed one pointer event into the session.
    ///
    /// Down and move events clamp the sample to the visible image,
    /// append it to the stroke, and request a redraw. Up and cancel
    /// events validate closure: the final position must be strictly
    /// closer than the closeness threshold to the stroke's first
    /// sample, and the stroke must carry at least the minimum sample
    /// count. A pointer-down while a stroke is active extends it; there
    /// is never more than one stroke in flight.
    ///
    /// Events are ignored while no source image is set, and while a
    /// validated stroke awaits [`CaptureSession::confirm`] or
    /// [`CaptureSession::discard`] — the stroke is immutable from
    /// successful closure validation until the next reset.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidClosure`] or
    /// [`CaptureError::InsufficientSamples`] on a failed release; the
    /// stroke is cleared and the session returns to `Idle`, ready for
    /// the next attempt.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<PointerOutcome, CaptureError> {
        if self.source.is_none() {
            // No image to trace over; the preview shows a placeholder.
            self.redraw_requested = true;
            return Ok(PointerOutcome::Ignored);
        }

        // A validated stroke is immutable until confirm or discard
        // resets the session; stray events while the confirmation
        // dialog is open must not disturb it.
        if self.phase == StrokePhase::Closed {
            return Ok(PointerOutcome::Ignored);
        }

        let rect = self.visible_image()?.rect();
        let sample = transform::clamp_to_visible(event.position, rect);

        match event.phase {
            PointerPhase::Down | PointerPhase::Move => {
                self.stroke.push(sample);
                self.phase = StrokePhase::Active;
                self.redraw_requested = true;
                Ok(PointerOutcome::StrokeExtended)
            }
            PointerPhase::Up | PointerPhase::Cancel => self.validate_closure(sample),
        }
    }

    /// Run the extraction for a validated stroke.
    ///
    /// Models the accepted branch of the host's confirmation dialog.
    /// The session resets to `Idle` whether or not extraction
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoPendingExtraction`] unless the stroke
    /// phase is `Closed`, and [`CaptureError::EmptyExtraction`] if the
    /// traced region encloses no pixels.
    pub fn confirm(&mut self) -> Result<RgbaImage, CaptureError> {
        if self.phase != StrokePhase::Closed {
            return Err(CaptureError::NoPendingExtraction);
        }
        let viewport = self.viewport;
        let config = self.config.clone();
        let stroke = std::mem::take(&mut self.stroke);
        let visible = self.visible_image()?;
        let result = extract::extract(&stroke, visible, viewport, &config);
        self.reset();
        result
    }

    /// Discard a validated stroke without extracting.
    ///
    /// Models the rejected branch of the host's confirmation dialog.
    pub fn discard(&mut self) {
        self.reset();
    }

    /// Render the preview frame for the current state: the visible
    /// image centered in the viewport, the dashed stroke overlay, and
    /// (when enabled and a stroke is in progress) the magnifier inset
    /// at the top-left corner with a center marker.
    ///
    /// With no source image set, returns a viewport-sized placeholder
    /// frame for the host to draw its notice over.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Surface`] if a work buffer cannot be
    /// allocated.
    pub fn render_preview(&mut self) -> Result<RgbaImage, CaptureError> {
        let mut canvas = raster::new_pixmap(self.viewport.width, self.viewport.height)?;

        if self.source.is_none() {
            let [r, g, b, a] = PLACEHOLDER_FILL;
            let color = tiny_skia::Color::from_rgba8(r, g, b, a);
            canvas.fill(color);
            return Ok(raster::rgba_from_pixmap(&canvas));
        }

        let config = self.config.clone();
        let stroke = self.stroke.clone();
        let visible = self.visible_image()?;

        let rect = visible.rect();
        let image_pixmap = raster::pixmap_from_rgba(visible.image())?;
        #[allow(clippy::cast_possible_truncation)]
        canvas.draw_pixmap(
            rect.left as i32,
            rect.top as i32,
            image_pixmap.as_ref(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );

        if let Some(&last) = stroke.last() {
            if config.magnifier_enabled {
                let inset = magnifier::render_magnifier(last, &stroke, visible, &config)?;
                let inset_pixmap = raster::pixmap_from_rgba(&inset)?;
                canvas.draw_pixmap(
                    0,
                    0,
                    inset_pixmap.as_ref(),
                    &tiny_skia::PixmapPaint::default(),
                    tiny_skia::Transform::identity(),
                    None,
                );
                draw_center_marker(&mut canvas, &config);
            }
            draw_stroke_overlay(&mut canvas, &stroke, &config);
        }

        Ok(raster::rgba_from_pixmap(&canvas))
    }

    /// Validate closure of the stroke on pointer release.
    fn validate_closure(&mut self, release: Sample) -> Result<PointerOutcome, CaptureError> {
        let Some(&first) = self.stroke.first() else {
            // Release with nothing recorded; nothing to validate.
            return Ok(PointerOutcome::Ignored);
        };

        let distance = first.truncated_distance(release);
        let threshold = self.config.close_distance;
        if distance >= threshold {
            self.reset();
            return Err(CaptureError::InvalidClosure {
                distance,
                threshold,
            });
        }

        let got = self.stroke.len();
        let minimum = self.config.min_samples;
        if got < minimum {
            self.reset();
            return Err(CaptureError::InsufficientSamples { got, minimum });
        }

        self.phase = StrokePhase::Closed;
        self.redraw_requested = true;
        Ok(PointerOutcome::ClosureReady)
    }

    /// Clear the stroke, return to `Idle`, and request a redraw.
    fn reset(&mut self) {
        self.stroke.clear();
        self.phase = StrokePhase::Idle;
        self.redraw_requested = true;
    }
}

/// Draw the dashed white stroke overlay onto the preview canvas.
fn draw_stroke_overlay(
    canvas: &mut tiny_skia::Pixmap,
    stroke_samples: &[Sample],
    config: &CaptureConfig,
) {
    let segments = path::smooth_path(stroke_samples, 1);
    if segments.len() < 2 {
        return;
    }
    let Some(skia_path) = path::to_skia_path(&segments, 0.0, 0.0, false) else {
        return;
    };

    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    let stroke = tiny_skia::Stroke {
        width: config.overlay_stroke_width,
        line_cap: tiny_skia::LineCap::Round,
        line_join: tiny_skia::LineJoin::Round,
        dash: tiny_skia::StrokeDash::new(config.overlay_dash.to_vec(), 0.0),
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

/// Draw the crosshair dot at the center of the magnifier inset.
fn draw_center_marker(canvas: &mut tiny_skia::Pixmap, config: &CaptureConfig) {
    #[allow(clippy::cast_precision_loss)]
    let center = config.magnifier_size as f32 / 2.0;
    let radius = (config.overlay_stroke_width / 2.0).max(1.0);
    let Some(dot) = tiny_skia::PathBuilder::from_circle(center, center, radius) else {
        return;
    };
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    canvas.fill_path(
        &dot,
        &paint,
        tiny_skia::FillRule::Winding,
        tiny_skia::Transform::identity(),
        None,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const VIEWPORT: Dimensions = Dimensions::new(300, 300);

    fn session_with_red_image() -> CaptureSession {
        let mut session = CaptureSession::new(CaptureConfig::default(), VIEWPORT);
        session.set_image(RgbaImage::from_pixel(300, 300, RED));
        session
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent {
            phase: PointerPhase::Down,
            position: Sample::new(x, y),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent {
            phase: PointerPhase::Move,
            position: Sample::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent {
            phase: PointerPhase::Up,
            position: Sample::new(x, y),
        }
    }

    /// Drive a 12-sample circular stroke, leaving the pointer down.
    fn trace_circle(session: &mut CaptureSession) -> Sample {
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<Sample> = (0..12)
            .map(|i| {
                let angle = i as f64 / 12.0 * std::f64::consts::TAU;
                Sample::new(
                    50.0f64.mul_add(angle.cos(), 100.0),
                    50.0f64.mul_add(angle.sin(), 100.0),
                )
            })
            .collect();
        for (i, s) in samples.iter().enumerate() {
            let event = if i == 0 {
                down(s.x, s.y)
            } else {
                mv(s.x, s.y)
            };
            assert_eq!(
                session.handle_pointer(event).unwrap(),
                PointerOutcome::StrokeExtended,
            );
        }
        samples[0]
    }

    #[test]
    fn pointer_events_without_image_are_ignored() {
        let mut session = CaptureSession::new(CaptureConfig::default(), VIEWPORT);
        let outcome = session.handle_pointer(down(10.0, 10.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
    }

    #[test]
    fn preview_without_image_is_placeholder_frame() {
        let mut session = CaptureSession::new(CaptureConfig::default(), VIEWPORT);
        let frame = session.render_preview().unwrap();
        assert_eq!(frame.dimensions(), (300, 300));
        assert_eq!(*frame.get_pixel(150, 150), Rgba(PLACEHOLDER_FILL));
    }

    #[test]
    fn down_and_move_grow_the_stroke() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(100.0, 100.0)).unwrap();
        session.handle_pointer(mv(110.0, 100.0)).unwrap();
        session.handle_pointer(mv(120.0, 100.0)).unwrap();
        assert_eq!(session.stroke().len(), 3);
        assert_eq!(session.phase(), StrokePhase::Active);
        assert!(session.take_redraw_request());
        assert!(!session.take_redraw_request());
    }

    #[test]
    fn samples_are_clamped_to_visible_image() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(-50.0, 400.0)).unwrap();
        assert_eq!(session.stroke()[0], Sample::new(0.0, 300.0));
    }

    #[test]
    fn second_down_extends_the_active_stroke() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(100.0, 100.0)).unwrap();
        session.handle_pointer(mv(110.0, 100.0)).unwrap();
        session.handle_pointer(down(120.0, 100.0)).unwrap();
        assert_eq!(session.stroke().len(), 3);
        assert_eq!(session.phase(), StrokePhase::Active);
    }

    #[test]
    fn release_far_from_start_is_invalid_closure() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(10.0, 10.0)).unwrap();
        for i in 1..15 {
            session.handle_pointer(mv(10.0 + f64::from(i), 10.0)).unwrap();
        }
        let result = session.handle_pointer(up(290.0, 290.0));
        assert!(matches!(
            result,
            Err(CaptureError::InvalidClosure { threshold: 100, .. }),
        ));
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
    }

    #[test]
    fn closure_threshold_is_strict() {
        // A release exactly at the threshold distance is rejected;
        // one pixel closer is accepted.
        let mut session = session_with_red_image();
        session.handle_pointer(down(50.0, 150.0)).unwrap();
        for i in 1..20 {
            session.handle_pointer(mv(50.0 + f64::from(i), 150.0)).unwrap();
        }
        let result = session.handle_pointer(up(150.0, 150.0));
        assert!(matches!(result, Err(CaptureError::InvalidClosure { .. })));

        let mut session = session_with_red_image();
        session.handle_pointer(down(50.0, 150.0)).unwrap();
        for i in 1..20 {
            session.handle_pointer(mv(50.0 + f64::from(i), 150.0)).unwrap();
        }
        let outcome = session.handle_pointer(up(149.0, 150.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::ClosureReady);
    }

    #[test]
    fn short_stroke_is_insufficient_samples() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(100.0, 100.0)).unwrap();
        session.handle_pointer(mv(105.0, 100.0)).unwrap();
        session.handle_pointer(mv(100.0, 105.0)).unwrap();
        let result = session.handle_pointer(up(100.0, 100.0));
        assert!(matches!(
            result,
            Err(CaptureError::InsufficientSamples { got: 3, minimum: 12 }),
        ));
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
    }

    #[test]
    fn release_without_stroke_is_ignored() {
        let mut session = session_with_red_image();
        let outcome = session.handle_pointer(up(100.0, 100.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);
    }

    #[test]
    fn cancel_validates_like_up() {
        let mut session = session_with_red_image();
        let start = trace_circle(&mut session);
        let event = PointerEvent {
            phase: PointerPhase::Cancel,
            position: start,
        };
        let outcome = session.handle_pointer(event).unwrap();
        assert_eq!(outcome, PointerOutcome::ClosureReady);
        assert_eq!(session.phase(), StrokePhase::Closed);
    }

    #[test]
    fn circle_gesture_extracts_sticker() {
        let mut session = session_with_red_image();
        let start = trace_circle(&mut session);
        let outcome = session.handle_pointer(up(start.x, start.y)).unwrap();
        assert_eq!(outcome, PointerOutcome::ClosureReady);

        let sticker = session.confirm().unwrap();
        let (w, h) = sticker.dimensions();
        assert!((90..=104).contains(&w), "unexpected width {w}");
        assert!((90..=104).contains(&h), "unexpected height {h}");
        assert_eq!(*sticker.get_pixel(w / 2, h / 2), RED);
        assert_eq!(*sticker.get_pixel(0, 0), Rgba([0, 0, 0, 0]));

        // The session is ready for the next gesture.
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
    }

    #[test]
    fn closed_stroke_is_immutable_until_reset() {
        let mut session = session_with_red_image();
        let start = trace_circle(&mut session);
        session.handle_pointer(up(start.x, start.y)).unwrap();
        assert_eq!(session.phase(), StrokePhase::Closed);
        let len_before = session.stroke().len();

        // Stray events while the confirmation dialog is open must not
        // disturb the validated stroke.
        let outcome = session.handle_pointer(down(200.0, 200.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert_eq!(session.stroke().len(), len_before);
        assert_eq!(session.phase(), StrokePhase::Closed);
        let outcome = session.handle_pointer(mv(210.0, 200.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);
        let outcome = session.handle_pointer(up(200.0, 200.0)).unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);

        // The pending extraction is still available.
        let sticker = session.confirm().unwrap();
        assert!(sticker.width() > 0);
        assert_eq!(session.phase(), StrokePhase::Idle);
    }

    #[test]
    fn discard_resets_without_extracting() {
        let mut session = session_with_red_image();
        let start = trace_circle(&mut session);
        session.handle_pointer(up(start.x, start.y)).unwrap();
        session.discard();
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
        assert!(matches!(
            session.confirm(),
            Err(CaptureError::NoPendingExtraction),
        ));
    }

    #[test]
    fn confirm_without_closed_stroke_is_error() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(100.0, 100.0)).unwrap();
        assert!(matches!(
            session.confirm(),
            Err(CaptureError::NoPendingExtraction),
        ));
    }

    #[test]
    fn set_image_invalidates_stroke_and_cache() {
        let mut session = session_with_red_image();
        session.handle_pointer(down(100.0, 100.0)).unwrap();
        session.set_image(RgbaImage::from_pixel(100, 100, RED));
        assert!(session.stroke().is_empty());
        assert_eq!(session.phase(), StrokePhase::Idle);
        // New image, new fit: 100x100 source in a 300x300 viewport
        // scales up to fill it.
        let rect = session.visible_image().unwrap().rect();
        assert!((rect.width - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn viewport_change_rebuilds_visible_image() {
        let mut session = session_with_red_image();
        session.set_viewport(Dimensions::new(150, 150));
        let rect = session.visible_image().unwrap().rect();
        assert!((rect.width - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn preview_with_stroke_contains_magnifier_inset() {
        let mut session = session_with_red_image();
        trace_circle(&mut session);
        let frame = session.render_preview().unwrap();
        assert_eq!(frame.dimensions(), (300, 300));
        // The magnifier inset occupies the top-left corner and is
        // opaque (image content or black padding), never the bare
        // source pixel.
        let inset_pixel = *frame.get_pixel(5, 5);
        assert_eq!(inset_pixel.0[3], 255);
    }

    #[test]
    fn preview_respects_magnifier_toggle() {
        let config = CaptureConfig {
            magnifier_enabled: false,
            ..CaptureConfig::default()
        };
        let mut session = CaptureSession::new(config, VIEWPORT);
        session.set_image(RgbaImage::from_pixel(300, 300, RED));
        trace_circle(&mut session);
        let frame = session.render_preview().unwrap();
        // Without the inset the top-left corner shows the image.
        assert_eq!(*frame.get_pixel(5, 5), RED);
    }
}
