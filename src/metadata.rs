//! Container metadata.
//!
//! [`VideoMetadata`] is what the demuxer declares about the video stream when
//! the file is opened. It is cached for the lifetime of the decoder and is
//! never corrected after the fact: the declared frame count in particular may
//! disagree with the number of frames that actually decode.

use std::path::PathBuf;
use std::time::Duration;

/// Metadata declared by the container for the selected video stream.
///
/// # Example
///
/// ```no_run
/// use delogo_capture::VideoCapture;
///
/// let capture = VideoCapture::open("input.mp4")?;
/// let metadata = capture.metadata();
/// println!(
///     "{}x{} @ {:.2} fps, {} frames declared",
///     metadata.width, metadata.height, metadata.frames_per_second, metadata.frame_count,
/// );
/// # Ok::<(), delogo_capture::CaptureError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Frame count declared by the container. Falls back to
    /// `duration * frames_per_second` when the stream carries no count.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container duration.
    pub duration: Duration,
    /// Path the file was opened from.
    pub path: PathBuf,
}
