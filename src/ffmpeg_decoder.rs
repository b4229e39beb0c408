//! FFmpeg-backed decoder.
//!
//! [`FfmpegDecoder`] implements [`FrameDecoder`] on top of `ffmpeg-next`.
//! Seeking goes through the demuxer (`avformat_seek_file`) to the nearest
//! keyframe at or before the target and then decodes forward, discarding
//! frames whose presentation time falls before the requested index. This is
//! exactly the mechanism that breaks down on files with damaged indexes or
//! inflated frame counts, which is why captures probe it before trusting it.
//!
//! Full decoding ([`FrameDecoder::decode_all`]) reopens the file and walks
//! every packet in order, so it does not depend on the index at all.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::decoder::FrameDecoder;
use crate::error::CaptureError;
use crate::frame::{ChannelOrder, Frame};
use crate::metadata::VideoMetadata;
use crate::property::CaptureProperty;
use crate::utilities::{
    estimate_frame_count, frame_index_to_seek_timestamp, frame_to_buffer, pts_to_frame_index,
};

/// Consecutive non-EOF demuxer errors tolerated before a read gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// Run of demuxer errors with no successful packet read in between.
#[derive(Debug, Default)]
struct ErrorStreak(u32);

impl ErrorStreak {
    fn reset(&mut self) {
        self.0 = 0;
    }

    /// Count one error. Returns `true` once the streak is long enough that
    /// the stream should be treated as ended.
    fn record(&mut self) -> bool {
        self.0 = self.0.saturating_add(1);
        self.0 >= MAX_CONSECUTIVE_READ_ERRORS
    }
}

/// What to do with a freshly decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePlacement {
    /// Before the pending seek target.
    Skip,
    /// Return it as the frame with this index.
    Deliver(u64),
    /// A seek is pending but the frame carries no timestamp, so it cannot be
    /// placed relative to the target.
    Unlocatable,
}

/// Place a decoded frame given its timestamp-derived index, if any.
///
/// Without a pending seek, frames without timestamps continue from
/// `position`. After a seek they are never assumed to be the target.
fn place_frame(
    timestamp_index: Option<u64>,
    pending_target: Option<u64>,
    position: u64,
) -> FramePlacement {
    match (timestamp_index, pending_target) {
        (Some(index), Some(target)) if index < target => FramePlacement::Skip,
        (Some(index), _) => FramePlacement::Deliver(index),
        (None, None) => FramePlacement::Deliver(position),
        (None, Some(_)) => FramePlacement::Unlocatable,
    }
}

/// A demuxer + decoder pair positioned by frame index.
///
/// # Example
///
/// ```no_run
/// use delogo_capture::{ChannelOrder, FfmpegDecoder, FrameDecoder};
///
/// let mut decoder = FfmpegDecoder::open("input.mp4", ChannelOrder::Rgb)?;
/// if decoder.seek(42) {
///     if let Some(frame) = decoder.read() {
///         frame.save("frame_42.png")?;
///     }
/// }
/// decoder.release();
/// # Ok::<(), delogo_capture::CaptureError>(())
/// ```
pub struct FfmpegDecoder {
    input_context: Option<Input>,
    decoder: Option<VideoDecoder>,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    metadata: VideoMetadata,
    order: ChannelOrder,
    /// Index of the frame the next `read` is expected to return.
    position: u64,
    /// Set by `seek`: frames before this index are decoded and discarded.
    pending_target: Option<u64>,
    eof_sent: bool,
}

/// Everything needed to decode the best video stream of a freshly opened file.
struct OpenedStream {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    metadata: VideoMetadata,
}

impl FfmpegDecoder {
    /// Open `path` and prepare its best video stream for decoding.
    ///
    /// Frames are produced in `order`; captures normalize them afterwards.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::FileOpen`] if the file cannot be opened or its
    ///   codec cannot be initialised.
    /// - [`CaptureError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P, order: ChannelOrder) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        log::debug!("Opening video file: {}", path.display());

        let stream = open_stream(path)?;
        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, {} frames declared [{}]",
            stream.video_stream_index,
            stream.metadata.width,
            stream.metadata.height,
            stream.metadata.frames_per_second,
            stream.metadata.frame_count,
            stream.metadata.codec,
        );

        Ok(Self {
            input_context: Some(stream.input_context),
            decoder: Some(stream.decoder),
            scaler: None,
            video_stream_index: stream.video_stream_index,
            time_base: stream.time_base,
            start_pts: stream.start_pts,
            metadata: stream.metadata,
            order,
            position: 0,
            pending_target: None,
            eof_sent: false,
        })
    }

    /// Metadata declared by the container at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Channel order frames are decoded in.
    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    fn decode_next(&mut self) -> Result<Option<Frame>, CaptureError> {
        let (Some(input_context), Some(decoder)) =
            (self.input_context.as_mut(), self.decoder.as_mut())
        else {
            return Ok(None);
        };

        let mut decoded = VideoFrame::empty();
        let mut errors = ErrorStreak::default();

        loop {
            if decoder.receive_frame(&mut decoded).is_ok() {
                let timestamp_index = decoded.timestamp().or_else(|| decoded.pts()).map(|pts| {
                    pts_to_frame_index(
                        pts,
                        self.start_pts,
                        self.time_base,
                        self.metadata.frames_per_second,
                    )
                });

                let placement = place_frame(timestamp_index, self.pending_target, self.position);
                let index = match placement {
                    FramePlacement::Skip => continue,
                    FramePlacement::Deliver(index) => index,
                    FramePlacement::Unlocatable => {
                        log::debug!(
                            "Frame decoded after seeking to {} has no timestamp",
                            self.position
                        );
                        return Ok(None);
                    }
                };

                self.pending_target = None;
                let frame = convert_frame(&mut self.scaler, &decoded, self.order, index)?;
                self.position = index + 1;
                return Ok(Some(frame));
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(input_context) {
                Ok(()) => {
                    errors.reset();
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = decoder.send_packet(&packet) {
                            log::debug!("Skipping undecodable packet: {error}");
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    if errors.record() {
                        log::debug!(
                            "Ending stream after {MAX_CONSECUTIVE_READ_ERRORS} demuxer errors: {error}"
                        );
                        if let Err(error) = decoder.send_eof() {
                            log::debug!("Failed to flush decoder: {error}");
                        }
                        self.eof_sent = true;
                    }
                }
            }
        }
    }

    fn decode_stream(
        &self,
        on_frame: &mut dyn FnMut(&Frame),
    ) -> Result<Vec<Frame>, CaptureError> {
        let path = self.metadata.path.as_path();
        let OpenedStream {
            mut input_context,
            mut decoder,
            video_stream_index,
            ..
        } = open_stream(path)?;

        let mut scaler = None;
        let mut decoded = VideoFrame::empty();
        let mut frames = Vec::new();

        for (stream, packet) in input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            if let Err(error) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet during full decode: {error}");
                continue;
            }
            drain_decoder(
                &mut decoder,
                &mut decoded,
                &mut scaler,
                self.order,
                &mut frames,
                on_frame,
            )?;
        }

        decoder.send_eof()?;
        drain_decoder(
            &mut decoder,
            &mut decoded,
            &mut scaler,
            self.order,
            &mut frames,
            on_frame,
        )?;

        if frames.is_empty() {
            return Err(CaptureError::Materialization(format!(
                "no decodable frames in {}",
                path.display()
            )));
        }
        Ok(frames)
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn is_open(&self) -> bool {
        self.input_context.is_some() && self.decoder.is_some()
    }

    fn property(&self, property: CaptureProperty) -> f64 {
        if !self.is_open() {
            return 0.0;
        }
        let fps = self.metadata.frames_per_second;
        match property {
            CaptureProperty::FrameCount => self.metadata.frame_count as f64,
            CaptureProperty::Width => self.metadata.width as f64,
            CaptureProperty::Height => self.metadata.height as f64,
            CaptureProperty::Fps => fps,
            CaptureProperty::PosFrames => self.position as f64,
            CaptureProperty::PosMsec => {
                if fps > 0.0 {
                    self.position as f64 / fps * 1000.0
                } else {
                    0.0
                }
            }
            CaptureProperty::PosRatio => {
                if self.metadata.frame_count > 0 {
                    self.position as f64 / self.metadata.frame_count as f64
                } else {
                    0.0
                }
            }
        }
    }

    fn seek(&mut self, frame_index: u64) -> bool {
        let (Some(input_context), Some(decoder)) =
            (self.input_context.as_mut(), self.decoder.as_mut())
        else {
            return false;
        };

        let timestamp =
            frame_index_to_seek_timestamp(frame_index, self.metadata.frames_per_second);
        if let Err(error) = input_context.seek(timestamp, ..timestamp) {
            log::debug!("Seek to frame {frame_index} failed: {error}");
            return false;
        }

        decoder.flush();
        self.eof_sent = false;
        self.pending_target = Some(frame_index);
        self.position = frame_index;
        true
    }

    fn read(&mut self) -> Option<Frame> {
        match self.decode_next() {
            Ok(frame) => frame,
            Err(error) => {
                log::debug!("Read at frame {} failed: {error}", self.position);
                None
            }
        }
    }

    fn decode_all(
        &mut self,
        on_frame: &mut dyn FnMut(&Frame),
    ) -> Result<Vec<Frame>, CaptureError> {
        if !self.is_open() {
            return Err(CaptureError::Materialization(
                "decoder has been released".to_string(),
            ));
        }
        log::info!("Decoding all frames of {}", self.metadata.path.display());

        self.decode_stream(on_frame).map_err(|error| match error {
            CaptureError::Materialization(_) => error,
            other => CaptureError::Materialization(other.to_string()),
        })
    }

    fn release(&mut self) {
        if self.input_context.is_some() {
            log::debug!("Releasing decoder for {}", self.metadata.path.display());
        }
        self.scaler = None;
        self.decoder = None;
        self.input_context = None;
        self.pending_target = None;
    }
}

fn open_stream(path: &Path) -> Result<OpenedStream, CaptureError> {
    let open_error = |reason: String| CaptureError::FileOpen {
        path: path.to_path_buf(),
        reason,
    };

    ffmpeg_next::init()
        .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

    let input_context =
        ffmpeg_next::format::input(path).map_err(|error| open_error(error.to_string()))?;

    let duration_microseconds = input_context.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let (decoder, video_stream_index, time_base, start_pts, frames_per_second, stream_frames) = {
        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(CaptureError::NoVideoStream)?;

        let index = stream.index();
        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| open_error(format!("Failed to read codec parameters for stream {index}: {error}")),
        )?;
        let decoder = decoder_context.decoder().video().map_err(|error| {
            open_error(format!("Failed to create video decoder for stream {index}: {error}"))
        })?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        (
            decoder,
            index,
            stream.time_base(),
            stream.start_time().max(0),
            frames_per_second,
            stream.frames(),
        )
    };

    let frame_count = if stream_frames > 0 {
        stream_frames as u64
    } else {
        estimate_frame_count(duration, frames_per_second)
    };

    let codec = decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let metadata = VideoMetadata {
        width: decoder.width(),
        height: decoder.height(),
        frames_per_second,
        frame_count,
        codec,
        duration,
        path: path.to_path_buf(),
    };

    Ok(OpenedStream {
        input_context,
        decoder,
        video_stream_index,
        time_base,
        start_pts,
        metadata,
    })
}

/// Scale a decoded frame into a packed 3-channel buffer in `order`.
///
/// The scaler is rebuilt whenever the source format or size changes.
fn convert_frame(
    scaler: &mut Option<ScalingContext>,
    decoded: &VideoFrame,
    order: ChannelOrder,
    index: u64,
) -> Result<Frame, CaptureError> {
    let width = decoded.width();
    let height = decoded.height();

    let stale = scaler.as_ref().is_none_or(|context| {
        let input = context.input();
        input.format != decoded.format() || input.width != width || input.height != height
    });
    if stale {
        *scaler = Some(ScalingContext::get(
            decoded.format(),
            width,
            height,
            order.to_ffmpeg_pixel(),
            width,
            height,
            ScalingFlags::BILINEAR,
        )?);
    }
    let scaler = scaler.as_mut().ok_or_else(|| {
        CaptureError::VideoDecodeError("pixel format converter unavailable".to_string())
    })?;

    let mut converted = VideoFrame::empty();
    scaler.run(decoded, &mut converted)?;
    let data = frame_to_buffer(&converted, width, height);
    Ok(Frame::new(data, width, height, index, order))
}

fn drain_decoder(
    decoder: &mut VideoDecoder,
    decoded: &mut VideoFrame,
    scaler: &mut Option<ScalingContext>,
    order: ChannelOrder,
    frames: &mut Vec<Frame>,
    on_frame: &mut dyn FnMut(&Frame),
) -> Result<(), CaptureError> {
    while decoder.receive_frame(decoded).is_ok() {
        let frame = convert_frame(scaler, decoded, order, frames.len() as u64)?;
        on_frame(&frame);
        frames.push(frame);
    }
    Ok(())
}
