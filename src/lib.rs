//! # delogo-capture
//!
//! Frame-accurate video reading for files whose container metadata cannot be
//! trusted.
//!
//! Videos that have been re-muxed, cut, or partially downloaded often
//! declare more frames than they contain, or have indexes that send a seek
//! somewhere other than where it was aimed. A [`VideoCapture`] checks this
//! empirically when it opens a file: it seeks to the last declared frame and
//! to frame 0 and tries to read both. If that works, frames are read by
//! seeking. If not, the whole stream is decoded into memory once and every
//! read is served from there, with the number of frames actually decoded as
//! the frame count.
//!
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use delogo_capture::{CaptureProperty, VideoCapture};
//!
//! let mut capture = VideoCapture::open("input.mp4")?;
//! println!("{:?} backend, {} frames", capture.mode(), capture.frame_count());
//!
//! let fps = capture.get(CaptureProperty::Fps);
//! if let Some(frame) = capture.read_at(250) {
//!     println!("frame 250 is at {:.2}s", 250.0 / fps);
//!     frame.save("frame_250.png")?;
//! }
//!
//! while let Some(frame) = capture.read() {
//!     // frames arrive in stream order, always RGB
//!     let _ = frame.data();
//! }
//! # Ok::<(), delogo_capture::CaptureError>(())
//! ```
//!
//! ## Features
//!
//! - **Probe** (`probe`): decide whether indexed seeking works for a file
//! - **Seek search** (`seek_finder`): locate the last frame a seek can reach
//! - **Two backends** (`source`): indexed pass-through or in-memory frames
//! - **Channel normalization**: every frame is RGB, whatever the decoder
//!   produced
//! - **Segments** (`segment`): time windows and clamped boxes for watermark
//!   spans
//! - **Progress**: callbacks while a stream is decoded into memory
//! - **Testing** (`testing` feature): an in-memory decoder whose declared
//!   and decodable frame counts can be set independently
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod capture;
pub mod config;
pub mod decoder;
pub mod error;
pub mod ffmpeg;
pub mod ffmpeg_decoder;
pub mod frame;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod property;
pub mod seek_finder;
pub mod segment;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod synthetic;
mod utilities;

pub use capture::{Frames, VideoCapture};
pub use config::CaptureOptions;
pub use decoder::FrameDecoder;
pub use error::CaptureError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use ffmpeg_decoder::FfmpegDecoder;
pub use frame::{CHANNELS, ChannelOrder, Frame};
pub use metadata::VideoMetadata;
pub use probe::{CaptureProbe, ProbeReport, ProbeStrategy, probe_indexed_access};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use property::CaptureProperty;
pub use seek_finder::{MAX_SEARCH_ITERATIONS, SeekSearch, find_last_readable_frame};
pub use segment::{BoundingBox, Segment, SegmentKind, tail_cut_frame};
pub use source::{BackendMode, FrameSource, IndexedSource, MaterializedSource};
#[cfg(any(test, feature = "testing"))]
pub use synthetic::{ReleaseTracker, SyntheticDecoder};
pub use utilities::frame_index_to_duration;
