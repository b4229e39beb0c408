//! The [`VideoCapture`] facade.
//!
//! `VideoCapture` owns a decoder and picks a backend exactly once, while
//! opening: if probing shows that indexed seeking works, every call goes
//! straight to the decoder; otherwise the stream is decoded into memory and
//! served from there. Callers see the same API either way.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;

use crate::config::CaptureOptions;
use crate::decoder::{FrameDecoder, declared_frame_count};
use crate::error::CaptureError;
use crate::ffmpeg_decoder::FfmpegDecoder;
use crate::frame::Frame;
use crate::metadata::VideoMetadata;
use crate::probe::{ProbeReport, probe_indexed_access};
use crate::property::CaptureProperty;
use crate::seek_finder::{SeekSearch, find_last_readable_frame};
use crate::source::{Backend, BackendMode, FrameSource, IndexedSource, MaterializedSource};

/// A frame-accurate reader over a video whose metadata may be wrong.
///
/// # Example
///
/// ```no_run
/// use delogo_capture::{CaptureProperty, VideoCapture};
///
/// let mut capture = VideoCapture::open("input.mp4")?;
/// let frames = capture.get(CaptureProperty::FrameCount) as u64;
/// if let Some(last) = frames.checked_sub(1).and_then(|index| capture.read_at(index)) {
///     last.save("last_frame.png")?;
/// }
/// capture.release();
/// # Ok::<(), delogo_capture::CaptureError>(())
/// ```
pub struct VideoCapture<D: FrameDecoder = FfmpegDecoder> {
    decoder: D,
    backend: Backend,
    probe_report: ProbeReport,
    released: bool,
}

impl<D: FrameDecoder> Debug for VideoCapture<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoCapture")
            .field("mode", &self.backend.mode())
            .field("probe_report", &self.probe_report)
            .field("released", &self.released)
            .finish()
    }
}

impl VideoCapture<FfmpegDecoder> {
    /// Open a video file with default options.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::FileOpen`] or [`CaptureError::NoVideoStream`]
    /// if the file cannot be opened, or [`CaptureError::Materialization`] if
    /// indexed seeking is untrusted and full decoding fails too.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        Self::open_with_options(path, &CaptureOptions::default())
    }

    /// Open a video file with explicit options.
    ///
    /// # Errors
    ///
    /// See [`open`](VideoCapture::open).
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: &CaptureOptions,
    ) -> Result<Self, CaptureError> {
        let decoder = FfmpegDecoder::open(path, options.channel_order)?;
        Self::from_decoder(decoder, options)
    }

    /// Metadata declared by the container.
    ///
    /// `frame_count` here is what the file claims; use
    /// [`frame_count`](VideoCapture::frame_count) for what the capture serves.
    pub fn metadata(&self) -> &VideoMetadata {
        self.decoder.metadata()
    }
}

impl<D: FrameDecoder> VideoCapture<D> {
    /// Wrap an already opened decoder, probe it, and select a backend.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Materialization`] if the in-memory backend is
    /// selected and full decoding fails. The decoder is released before the
    /// error is returned.
    pub fn from_decoder(mut decoder: D, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let probe_report = probe_indexed_access(&mut decoder, options.probe_strategy);

        if !probe_report.trusted {
            log::warn!(
                "Indexed seeking is unreliable ({probe_report}); decoding all frames into memory"
            );
            if options.seek_diagnostics {
                let search = find_last_readable_frame(&mut decoder, probe_report.declared_frame_count);
                log::info!(
                    "Last frame reachable by seeking: {} of {} declared ({} probes)",
                    search.last_readable,
                    probe_report.declared_frame_count,
                    search.probes,
                );
            }
        }

        let mode = match options.forced_mode {
            Some(mode) => {
                log::debug!("Backend forced to {mode:?}");
                mode
            }
            None if probe_report.trusted => BackendMode::Indexed,
            None => BackendMode::Materialized,
        };

        let backend = match mode {
            BackendMode::Indexed => Backend::Indexed(IndexedSource),
            BackendMode::Materialized => match MaterializedSource::materialize(
                &mut decoder,
                options.progress.clone(),
                options.batch_size,
            ) {
                Ok(source) => Backend::Materialized(source),
                Err(error) => {
                    decoder.release();
                    return Err(error);
                }
            },
        };
        log::debug!("Selected {mode:?} backend");

        Ok(Self {
            decoder,
            backend,
            probe_report,
            released: false,
        })
    }

    /// Which backend was selected at open.
    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// The probe verdict recorded at open.
    pub fn probe_report(&self) -> &ProbeReport {
        &self.probe_report
    }

    /// `true` while the capture can serve frames consistently.
    ///
    /// In materialized mode this also requires the number of decoded frames
    /// to match the count the decoder declares, so a capture over a
    /// truncated file reports `false` here even though its reads succeed.
    pub fn is_open(&self) -> bool {
        !self.released && self.backend.is_live(&self.decoder)
    }

    /// Query a property. Returns `0.0` once released.
    ///
    /// In materialized mode [`CaptureProperty::FrameCount`] is the number of
    /// frames actually decoded.
    pub fn get(&self, property: CaptureProperty) -> f64 {
        if self.released {
            return 0.0;
        }
        self.backend.property(&self.decoder, property)
    }

    /// Number of frames the capture can serve.
    pub fn frame_count(&self) -> u64 {
        let count = self.get(CaptureProperty::FrameCount);
        if count.is_finite() && count > 0.0 {
            count as u64
        } else {
            0
        }
    }

    /// The frame at `frame_index`.
    ///
    /// In indexed mode this repositions the decoder, so the next
    /// [`read`](VideoCapture::read) continues after this frame. In
    /// materialized mode it is a lookup that leaves the sequential cursor
    /// alone.
    pub fn read_at(&mut self, frame_index: u64) -> Option<Frame> {
        if self.released {
            return None;
        }
        self.backend.read_at(&mut self.decoder, frame_index)
    }

    /// Seek by `property` and read one frame.
    ///
    /// Negative or non-finite positions produce `Ok(None)`; fractional
    /// positions are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::UnsupportedSeekProperty`] for anything other
    /// than [`CaptureProperty::PosFrames`].
    pub fn set_and_read(
        &mut self,
        property: CaptureProperty,
        value: f64,
    ) -> Result<Option<Frame>, CaptureError> {
        if !property.is_frame_position() {
            return Err(CaptureError::UnsupportedSeekProperty(property));
        }
        if !value.is_finite() || value < 0.0 {
            return Ok(None);
        }
        Ok(self.read_at(value as u64))
    }

    /// The next frame in sequence, or `None` when exhausted.
    pub fn read(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        self.backend.read_next(&mut self.decoder)
    }

    /// Iterate over the remaining frames via [`read`](VideoCapture::read).
    pub fn frames(&mut self) -> Frames<'_, D> {
        Frames { capture: self }
    }

    /// Binary-search the decoder for the last frame reachable by seeking.
    ///
    /// Purely diagnostic: the backend is not affected. Returns `None` once
    /// released.
    pub fn find_last_readable_frame(&mut self) -> Option<SeekSearch> {
        if self.released {
            return None;
        }
        let declared = declared_frame_count(&self.decoder);
        Some(find_last_readable_frame(&mut self.decoder, declared))
    }

    /// The underlying decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Release the decoder and any decoded frames. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.decoder.release();
        if let Backend::Materialized(source) = &mut self.backend {
            *source = MaterializedSource::from_frames(Vec::new());
        }
        self.released = true;
        log::debug!("Capture released");
    }
}

impl<D: FrameDecoder> Drop for VideoCapture<D> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Iterator returned by [`VideoCapture::frames`].
pub struct Frames<'a, D: FrameDecoder> {
    capture: &'a mut VideoCapture<D>,
}

impl<D: FrameDecoder> Iterator for Frames<'_, D> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.capture.read()
    }
}
