//! The raw decoder contract.
//!
//! [`FrameDecoder`] is the primitive every capture is built on: position by
//! frame index, read the next frame, answer property queries, and decode the
//! whole stream in one pass. It deliberately mirrors what a demuxer/decoder
//! pair can do on its own, including its failure modes: `seek` may claim
//! success for a position that will never decode, and `property` reports
//! whatever the container declared.
//!
//! [`FfmpegDecoder`](crate::FfmpegDecoder) is the production implementation.
//! With the `testing` feature enabled, `SyntheticDecoder` is an in-memory
//! stand-in with a configurable gap between declared and decodable frames.

use crate::error::CaptureError;
use crate::frame::Frame;
use crate::property::CaptureProperty;

/// A decoder handle that can seek by frame index.
///
/// Implementations are driven from a single thread; every call blocks until
/// the underlying decoder has finished.
pub trait FrameDecoder {
    /// Returns `true` until [`release`](FrameDecoder::release) is called.
    fn is_open(&self) -> bool;

    /// Report a property as declared by the container, or the decoder's
    /// current position for the `Pos*` properties. Returns `0.0` once
    /// released.
    fn property(&self, property: CaptureProperty) -> f64;

    /// Position the decoder so the next [`read`](FrameDecoder::read)
    /// returns `frame_index`. Returns `false` if the seek itself failed.
    /// A `true` result does not promise the following read will succeed.
    fn seek(&mut self, frame_index: u64) -> bool;

    /// Decode the next frame, in the decoder's native channel order.
    /// Returns `None` at the end of the decodable range.
    fn read(&mut self) -> Option<Frame>;

    /// Decode every frame of the stream from the start, independently of
    /// the current seek position.
    ///
    /// `on_frame` is invoked after each decoded frame. An error here is
    /// fatal for the caller: there is no further fallback.
    fn decode_all(&mut self, on_frame: &mut dyn FnMut(&Frame))
    -> Result<Vec<Frame>, CaptureError>;

    /// Close the decoder and free its resources. Idempotent.
    fn release(&mut self);
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for Box<D> {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn property(&self, property: CaptureProperty) -> f64 {
        (**self).property(property)
    }

    fn seek(&mut self, frame_index: u64) -> bool {
        (**self).seek(frame_index)
    }

    fn read(&mut self) -> Option<Frame> {
        (**self).read()
    }

    fn decode_all(
        &mut self,
        on_frame: &mut dyn FnMut(&Frame),
    ) -> Result<Vec<Frame>, CaptureError> {
        (**self).decode_all(on_frame)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Read the frame at `frame_index` through seek + read.
pub(crate) fn seek_and_read<D: FrameDecoder + ?Sized>(
    decoder: &mut D,
    frame_index: u64,
) -> Option<Frame> {
    if !decoder.seek(frame_index) {
        return None;
    }
    decoder.read()
}

/// Declared frame count, clamped to a non-negative integer.
pub(crate) fn declared_frame_count<D: FrameDecoder + ?Sized>(decoder: &D) -> u64 {
    let count = decoder.property(CaptureProperty::FrameCount);
    if count.is_finite() && count > 0.0 {
        count as u64
    } else {
        0
    }
}
