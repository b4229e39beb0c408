//! Error types for the `delogo-capture` crate.
//!
//! [`CaptureError`] is returned by every fallible operation. Read misses
//! (seeking past the decodable range, an exhausted cursor) are not errors:
//! they surface as `None` from the read methods. Only construction-time
//! failures and caller contract violations end up here.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::property::CaptureProperty;

/// The unified error type for all `delogo-capture` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoCapture::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A decoded frame could not be converted into a [`crate::Frame`].
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// Fully decoding the stream into memory failed.
    ///
    /// This is fatal: it is the fallback for files whose indexed seeking
    /// cannot be trusted, so there is nothing left to fall back to.
    #[error("Failed to materialize video frames: {0}")]
    Materialization(String),

    /// A seek was requested in a unit other than frame index.
    #[error("Cannot seek by {0}: only frame positions are accepted")]
    UnsupportedSeekProperty(CaptureProperty),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for CaptureError {
    fn from(error: FfmpegError) -> Self {
        CaptureError::FfmpegError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_seek_names_the_property() {
        let error = CaptureError::UnsupportedSeekProperty(CaptureProperty::PosMsec);
        let message = error.to_string();
        assert!(message.contains("position in milliseconds"), "{message}");
    }

    #[test]
    fn ffmpeg_errors_convert() {
        let error: CaptureError = FfmpegError::Eof.into();
        assert!(matches!(error, CaptureError::FfmpegError(_)));
    }
}
