//! The two capture backends.
//!
//! A [`FrameSource`] answers the capture's questions using a decoder it does
//! not own. [`IndexedSource`] passes every call straight through to the
//! decoder. [`MaterializedSource`] decodes the whole stream once and serves
//! frames from memory afterwards.
//!
//! The backends deliberately disagree on one point. An indexed `read_at`
//! moves the decoder, so the next `read_next` continues after the frame
//! that was just read. A materialized `read_at` is a plain lookup and leaves
//! the sequential cursor where it was.

use std::sync::Arc;

use crate::decoder::{FrameDecoder, declared_frame_count, seek_and_read};
use crate::error::CaptureError;
use crate::frame::Frame;
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};
use crate::property::CaptureProperty;

/// Which backend a capture is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendMode {
    /// Frames are read by seeking the decoder.
    Indexed,
    /// Frames were decoded into memory at open.
    Materialized,
}

/// Capability set shared by both backends.
///
/// Every frame returned has been normalized to
/// [`ChannelOrder::CANONICAL`](crate::ChannelOrder::CANONICAL).
pub trait FrameSource {
    /// Which backend this is.
    fn mode(&self) -> BackendMode;

    /// Property value as this backend sees it.
    fn property<D: FrameDecoder + ?Sized>(&self, decoder: &D, property: CaptureProperty) -> f64;

    /// The frame at `frame_index`, or `None` if it cannot be produced.
    fn read_at<D: FrameDecoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        frame_index: u64,
    ) -> Option<Frame>;

    /// The frame under the sequential cursor, advancing it.
    fn read_next<D: FrameDecoder + ?Sized>(&mut self, decoder: &mut D) -> Option<Frame>;

    /// Whether the backend and its decoder are in a usable, consistent state.
    fn is_live<D: FrameDecoder + ?Sized>(&self, decoder: &D) -> bool;
}

/// Pass-through backend for sources whose indexed seeking was trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedSource;

impl FrameSource for IndexedSource {
    fn mode(&self) -> BackendMode {
        BackendMode::Indexed
    }

    fn property<D: FrameDecoder + ?Sized>(&self, decoder: &D, property: CaptureProperty) -> f64 {
        decoder.property(property)
    }

    fn read_at<D: FrameDecoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        frame_index: u64,
    ) -> Option<Frame> {
        seek_and_read(decoder, frame_index).map(Frame::into_canonical)
    }

    fn read_next<D: FrameDecoder + ?Sized>(&mut self, decoder: &mut D) -> Option<Frame> {
        decoder.read().map(Frame::into_canonical)
    }

    fn is_live<D: FrameDecoder + ?Sized>(&self, decoder: &D) -> bool {
        decoder.is_open()
    }
}

/// In-memory backend holding every decodable frame.
///
/// The number of frames actually decoded is the authoritative frame count,
/// whatever the container declared.
#[derive(Debug, Clone)]
pub struct MaterializedSource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl MaterializedSource {
    /// Decode the whole stream through `decoder`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Materialization`] if full decoding fails.
    pub(crate) fn materialize<D: FrameDecoder + ?Sized>(
        decoder: &mut D,
        progress: Arc<dyn ProgressCallback>,
        batch_size: u64,
    ) -> Result<Self, CaptureError> {
        let declared = declared_frame_count(decoder);
        let mut tracker = ProgressTracker::new(
            progress,
            OperationType::Materialization,
            (declared > 0).then_some(declared),
            batch_size,
        );

        let decoded = decoder.decode_all(&mut |frame: &Frame| tracker.advance(Some(frame.index())))?;
        tracker.finish();

        let frames: Vec<Frame> = decoded.into_iter().map(Frame::into_canonical).collect();
        log::info!(
            "Materialized {} frames ({} declared)",
            frames.len(),
            declared
        );
        Ok(Self { frames, cursor: 0 })
    }

    /// Build from frames that are already decoded.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Frame::into_canonical).collect(),
            cursor: 0,
        }
    }

    /// Number of frames held, which is the authoritative frame count.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when nothing was decoded, or after the capture was released.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the frame the next sequential read returns.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl FrameSource for MaterializedSource {
    fn mode(&self) -> BackendMode {
        BackendMode::Materialized
    }

    fn property<D: FrameDecoder + ?Sized>(&self, decoder: &D, property: CaptureProperty) -> f64 {
        match property {
            CaptureProperty::FrameCount => self.frames.len() as f64,
            other => decoder.property(other),
        }
    }

    fn read_at<D: FrameDecoder + ?Sized>(
        &mut self,
        _decoder: &mut D,
        frame_index: u64,
    ) -> Option<Frame> {
        let index = usize::try_from(frame_index).ok()?;
        self.frames.get(index).cloned()
    }

    fn read_next<D: FrameDecoder + ?Sized>(&mut self, _decoder: &mut D) -> Option<Frame> {
        let frame = self.frames.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(frame)
    }

    fn is_live<D: FrameDecoder + ?Sized>(&self, decoder: &D) -> bool {
        decoder.is_open() && self.frames.len() as u64 == declared_frame_count(decoder)
    }
}

/// The backend chosen at open, fixed for the lifetime of a capture.
#[derive(Debug, Clone)]
pub(crate) enum Backend {
    Indexed(IndexedSource),
    Materialized(MaterializedSource),
}

impl FrameSource for Backend {
    fn mode(&self) -> BackendMode {
        match self {
            Backend::Indexed(source) => source.mode(),
            Backend::Materialized(source) => source.mode(),
        }
    }

    fn property<D: FrameDecoder + ?Sized>(&self, decoder: &D, property: CaptureProperty) -> f64 {
        match self {
            Backend::Indexed(source) => source.property(decoder, property),
            Backend::Materialized(source) => source.property(decoder, property),
        }
    }

    fn read_at<D: FrameDecoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        frame_index: u64,
    ) -> Option<Frame> {
        match self {
            Backend::Indexed(source) => source.read_at(decoder, frame_index),
            Backend::Materialized(source) => source.read_at(decoder, frame_index),
        }
    }

    fn read_next<D: FrameDecoder + ?Sized>(&mut self, decoder: &mut D) -> Option<Frame> {
        match self {
            Backend::Indexed(source) => source.read_next(decoder),
            Backend::Materialized(source) => source.read_next(decoder),
        }
    }

    fn is_live<D: FrameDecoder + ?Sized>(&self, decoder: &D) -> bool {
        match self {
            Backend::Indexed(source) => source.is_live(decoder),
            Backend::Materialized(source) => source.is_live(decoder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;
    use crate::progress::NoOpProgress;
    use crate::synthetic::SyntheticDecoder;

    fn materialize(decoder: &mut SyntheticDecoder) -> MaterializedSource {
        MaterializedSource::materialize(decoder, Arc::new(NoOpProgress), 1).expect("materialize")
    }

    #[test]
    fn indexed_read_at_moves_the_cursor() {
        let mut decoder = SyntheticDecoder::new(20);
        let mut source = IndexedSource;
        assert_eq!(source.read_at(&mut decoder, 10).map(|f| f.index()), Some(10));
        assert_eq!(source.read_next(&mut decoder).map(|f| f.index()), Some(11));
    }

    #[test]
    fn materialized_read_at_leaves_the_cursor() {
        let mut decoder = SyntheticDecoder::new(20);
        let mut source = materialize(&mut decoder);
        assert_eq!(source.read_at(&mut decoder, 10).map(|f| f.index()), Some(10));
        assert_eq!(source.read_next(&mut decoder).map(|f| f.index()), Some(0));
        assert_eq!(source.cursor(), 1);
    }

    #[test]
    fn materialized_reads_are_bounded() {
        let mut decoder = SyntheticDecoder::new(5).with_decodable_frames(3);
        let mut source = materialize(&mut decoder);
        assert_eq!(source.len(), 3);
        assert!(source.read_at(&mut decoder, 3).is_none());
        assert!(source.read_at(&mut decoder, u64::MAX).is_none());
        for expected in 0..3 {
            assert_eq!(source.read_next(&mut decoder).map(|f| f.index()), Some(expected));
        }
        assert!(source.read_next(&mut decoder).is_none());
        assert!(source.read_next(&mut decoder).is_none());
    }

    #[test]
    fn materialized_frame_count_is_the_decoded_length() {
        let mut decoder = SyntheticDecoder::new(100).with_decodable_frames(80);
        let source = materialize(&mut decoder);
        assert_eq!(source.property(&decoder, CaptureProperty::FrameCount), 80.0);
        assert_eq!(source.property(&decoder, CaptureProperty::Width), 4.0);
        assert!(!source.is_live(&decoder));
    }

    #[test]
    fn materialized_is_live_when_counts_agree() {
        let mut decoder = SyntheticDecoder::new(12);
        let source = materialize(&mut decoder);
        assert!(!source.is_empty());
        assert!(source.is_live(&decoder));
        decoder.release();
        assert!(!source.is_live(&decoder));
    }

    #[test]
    fn both_backends_normalize_channel_order() {
        let mut decoder = SyntheticDecoder::new(4).with_channel_order(ChannelOrder::Bgr);
        let indexed = IndexedSource.read_at(&mut decoder, 2).expect("indexed frame");
        assert_eq!(indexed.channel_order(), ChannelOrder::Rgb);
        assert_eq!(indexed.pixel(1, 1), Some(SyntheticDecoder::expected_pixel(2, 1, 1)));

        let mut source = materialize(&mut decoder);
        let materialized = source.read_at(&mut decoder, 2).expect("materialized frame");
        assert_eq!(materialized, indexed);
    }

    #[test]
    fn prebuilt_frames_are_normalized() {
        let frame = Frame::new(vec![9, 8, 7], 1, 1, 0, ChannelOrder::Bgr);
        let mut decoder = SyntheticDecoder::new(1);
        let mut source = MaterializedSource::from_frames(vec![frame]);
        assert_eq!(source.len(), 1);
        let served = source.read_next(&mut decoder).expect("frame");
        assert_eq!(served.data(), &[7, 8, 9]);
        assert!(MaterializedSource::from_frames(Vec::new()).is_empty());
    }

    #[test]
    fn materialization_failure_propagates() {
        let mut decoder = SyntheticDecoder::new(4).with_failing_materialization();
        let result = MaterializedSource::materialize(&mut decoder, Arc::new(NoOpProgress), 1);
        assert!(matches!(result, Err(CaptureError::Materialization(_))));
    }

    #[test]
    fn backend_dispatches_by_variant() {
        let mut decoder = SyntheticDecoder::new(6);
        let backend = Backend::Materialized(materialize(&mut decoder));
        assert_eq!(backend.mode(), BackendMode::Materialized);
        assert_eq!(Backend::Indexed(IndexedSource).mode(), BackendMode::Indexed);
    }
}
