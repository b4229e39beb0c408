//! Watermark segments.
//!
//! A [`Segment`] describes where and when a watermark appears: a pixel box
//! and a span of frame positions. Segments come from an external detector;
//! this module only provides the arithmetic an editing pipeline needs to
//! turn them into time ranges and safe crop boxes for a given video.

use std::time::Duration;

use crate::utilities::frame_position_to_duration;

/// Whether a segment overlays the video or occupies its trailing frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// A watermark drawn over the picture for a span of frames.
    Inner,
    /// Trailing frames (an outro card, for instance) to be cut entirely.
    Tail,
}

/// Pixel box in `top, bottom, left, right` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// First row covered by the box.
    pub top: u32,
    /// Row just below the box.
    pub bottom: u32,
    /// First column covered by the box.
    pub left: u32,
    /// Column just right of the box.
    pub right: u32,
}

impl BoundingBox {
    /// Build a box from its edges, in the same order as the fields.
    pub fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Horizontal extent, zero for an inverted box.
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Vertical extent, zero for an inverted box.
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Clamp into `[1, width - 1] x [1, height - 1]`, keeping the box off
    /// the outermost row and column of the frame.
    pub fn clamped_to(&self, width: u32, height: u32) -> BoundingBox {
        let max_x = width.saturating_sub(1).max(1);
        let max_y = height.saturating_sub(1).max(1);
        BoundingBox {
            top: self.top.clamp(1, max_y),
            bottom: self.bottom.clamp(1, max_y),
            left: self.left.clamp(1, max_x),
            right: self.right.clamp(1, max_x),
        }
    }
}

/// One detected watermark occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Where the watermark is. Tail segments usually have none.
    pub bbox: Option<BoundingBox>,
    /// Free-form label from the detector.
    pub label: String,
    /// Overlay or trailing cut.
    pub kind: SegmentKind,
    /// First frame position, possibly fractional.
    pub start_frame: f64,
    /// Last frame position, possibly fractional.
    pub end_frame: f64,
}

impl Segment {
    /// A watermark drawn inside `bbox` from `start_frame` to `end_frame`.
    pub fn inner(
        bbox: BoundingBox,
        label: impl Into<String>,
        start_frame: f64,
        end_frame: f64,
    ) -> Self {
        Self {
            bbox: Some(bbox),
            label: label.into(),
            kind: SegmentKind::Inner,
            start_frame,
            end_frame,
        }
    }

    /// Trailing frames from `start_frame` on, with no box.
    pub fn tail(label: impl Into<String>, start_frame: f64, end_frame: f64) -> Self {
        Self {
            bbox: None,
            label: label.into(),
            kind: SegmentKind::Tail,
            start_frame,
            end_frame,
        }
    }

    /// Start and end of the segment in seconds, as `frame / fps`.
    ///
    /// Returns `None` for a non-positive or non-finite `fps`, or when either
    /// end is not finite or too far out to be a [`Duration`].
    pub fn time_window(&self, frames_per_second: f64) -> Option<(Duration, Duration)> {
        Some((
            frame_position_to_duration(self.start_frame, frames_per_second)?,
            frame_position_to_duration(self.end_frame, frames_per_second)?,
        ))
    }

    /// Copy of this segment with its box clamped to a `width x height` frame.
    pub fn clamped_to(&self, width: u32, height: u32) -> Segment {
        Segment {
            bbox: self.bbox.map(|bbox| bbox.clamped_to(width, height)),
            ..self.clone()
        }
    }
}

/// Frame position at which the video should be cut, if any.
///
/// This is the start of the last [`SegmentKind::Tail`] segment. `None` when
/// there is no tail segment, or when the cut would fall on or after the
/// final frame and so remove nothing.
pub fn tail_cut_frame(segments: &[Segment], frame_count: u64) -> Option<f64> {
    let start = segments
        .iter()
        .rev()
        .find(|segment| segment.kind == SegmentKind::Tail)?
        .start_frame;
    let last_frame = frame_count.checked_sub(1)? as f64;
    (start >= 0.0 && start < last_frame).then_some(start)
}
