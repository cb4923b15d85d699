//! Path building: smooth a raw stroke into a piecewise quadratic curve.
//!
//! Samples are visited at a configurable stride. The first visited
//! sample opens the path; each subsequent visited sample that is not
//! the last becomes the control point of a quadratic curve ending at
//! the *next* sample; the final sample is reached with a straight
//! segment. The resulting path starts exactly at the first sample and
//! ends exactly at the last sample regardless of stride, which the
//! closure-distance check and boundary masking rely on.

use crate::types::Sample;

/// One segment of a smoothed path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Open the path at a point.
    MoveTo(Sample),
    /// Quadratic curve through a control point to an end point.
    QuadTo {
        /// Control point the curve bends toward.
        ctrl: Sample,
        /// End point the curve terminates at.
        end: Sample,
    },
    /// Straight segment to a point.
    LineTo(Sample),
}

impl PathSegment {
    /// The point this segment leaves the pen at.
    #[must_use]
    pub const fn end_point(self) -> Sample {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) => p,
            Self::QuadTo { end, .. } => end,
        }
    }
}

/// Build a smoothed path from ordered samples, visiting every
/// `stride`-th sample.
///
/// A stride of 0 is treated as 1. Fewer than two samples produce a
/// degenerate path (a lone move-to, or nothing at all); callers must
/// not feed such a path to extraction.
#[must_use]
pub fn smooth_path(samples: &[Sample], stride: usize) -> Vec<PathSegment> {
    let stride = stride.max(1);
    let Some(&first) = samples.first() else {
        return Vec::new();
    };

    let last_index = samples.len() - 1;
    let mut segments = vec![PathSegment::MoveTo(first)];

    let mut i = stride;
    while i < samples.len() {
        if i < last_index {
            segments.push(PathSegment::QuadTo {
                ctrl: samples[i],
                end: samples[i + 1],
            });
        } else {
            segments.push(PathSegment::LineTo(samples[last_index]));
        }
        i += stride;
    }

    // Large strides can overshoot the tail; pin the path end to the
    // final recorded sample.
    if let Some(seg) = segments.last()
        && seg.end_point() != samples[last_index]
    {
        segments.push(PathSegment::LineTo(samples[last_index]));
    }

    segments
}

/// Convert a segment list into a `tiny_skia::Path`, translating every
/// coordinate by `(dx, dy)`.
///
/// Returns `None` for empty or degenerate segment lists that
/// `tiny_skia` cannot finish into a path. When `close` is set the
/// contour is closed back to its start, which extraction uses to fill
/// the traced outline.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_skia_path(
    segments: &[PathSegment],
    dx: f64,
    dy: f64,
    close: bool,
) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for seg in segments {
        match *seg {
            PathSegment::MoveTo(p) => pb.move_to((p.x + dx) as f32, (p.y + dy) as f32),
            PathSegment::QuadTo { ctrl, end } => pb.quad_to(
                (ctrl.x + dx) as f32,
                (ctrl.y + dy) as f32,
                (end.x + dx) as f32,
                (end.y + dy) as f32,
            ),
            PathSegment::LineTo(p) => pb.line_to((p.x + dx) as f32, (p.y + dy) as f32),
        }
    }
    if close {
        pb.close();
    }
    pb.finish()
}
