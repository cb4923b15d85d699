//! kirinuki-core: Freehand-region capture and extraction (sans-IO).
//!
//! Lets a host trace a freehand closed curve over a displayed image
//! and cut out the enclosed region as a tightly-cropped image with a
//! transparent background:
//! pointer samples -> clamped stroke -> smoothed closed path ->
//! masked source-in composite -> bounding-box trim.
//!
//! This crate has **no I/O dependencies** -- it consumes in-memory
//! pixel buffers and pointer events and returns structured data.
//! Window management, file decode, and confirmation dialogs belong to
//! the host.

pub mod extract;
pub mod magnifier;
pub mod path;
pub mod raster;
pub mod session;
pub mod transform;
pub mod types;
pub mod visible;

pub use session::{CaptureSession, PointerEvent, PointerOutcome, PointerPhase, StrokePhase};
pub use types::{CaptureConfig, CaptureError, Dimensions, PixelRect, RgbaImage, Sample};
pub use visible::VisibleImage;
