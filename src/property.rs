//! Capture property identifiers.
//!
//! [`CaptureProperty`] names the numeric values a capture can report through
//! [`VideoCapture::get`](crate::VideoCapture::get). Only
//! [`CaptureProperty::PosFrames`] is a valid positioning unit for
//! [`VideoCapture::set_and_read`](crate::VideoCapture::set_and_read).

use std::fmt::{Display, Formatter, Result as FmtResult};

/// A property that can be queried from a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureProperty {
    /// Number of frames in the stream.
    FrameCount,
    /// Frame width in pixels.
    Width,
    /// Frame height in pixels.
    Height,
    /// Frames per second.
    Fps,
    /// Index of the next frame the decoder will return.
    PosFrames,
    /// Decoder position in milliseconds.
    PosMsec,
    /// Decoder position relative to the stream length (0.0 to 1.0).
    PosRatio,
}

impl CaptureProperty {
    /// Returns `true` if this property positions the decoder by frame index.
    pub fn is_frame_position(self) -> bool {
        matches!(self, CaptureProperty::PosFrames)
    }
}

impl Display for CaptureProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            CaptureProperty::FrameCount => "frame count",
            CaptureProperty::Width => "width",
            CaptureProperty::Height => "height",
            CaptureProperty::Fps => "frames per second",
            CaptureProperty::PosFrames => "position in frames",
            CaptureProperty::PosMsec => "position in milliseconds",
            CaptureProperty::PosRatio => "relative position",
        };
        f.write_str(name)
    }
}
