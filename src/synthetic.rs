//! Deterministic in-memory decoder.
//!
//! [`SyntheticDecoder`] behaves like a demuxer whose metadata may lie: it
//! declares one frame count, decodes a (possibly smaller) number of frames
//! through seek + read, and can be configured to refuse frame 0, to refuse
//! a late seek back to frame 0, or to fail full decoding. Pixels encode the frame index so tests can tell exactly
//! which frame came back:
//!
//! - channel R = `index % 256`
//! - channel G = `x % 256`
//! - channel B = `y % 256`
//!
//! Frames are produced in the configured native channel order, so a `Bgr`
//! decoder exercises channel normalization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::decoder::FrameDecoder;
use crate::error::CaptureError;
use crate::frame::{ChannelOrder, Frame};
use crate::property::CaptureProperty;

/// Shared view of whether a [`SyntheticDecoder`] has been released, usable
/// after the decoder itself has been moved into a capture.
#[derive(Debug, Clone)]
pub struct ReleaseTracker(Arc<AtomicBool>);

impl ReleaseTracker {
    /// `true` once the tracked decoder has been released.
    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// An in-memory decoder with configurable metadata/content mismatch.
#[derive(Debug)]
pub struct SyntheticDecoder {
    declared_frames: u64,
    decodable_frames: u64,
    materializable_frames: Option<u64>,
    width: u32,
    height: u32,
    frames_per_second: f64,
    order: ChannelOrder,
    head_readable: bool,
    rewind_fails_after: Option<u64>,
    materialization_fails: bool,
    position: u64,
    seeks: u64,
    reads: u64,
    released: Arc<AtomicBool>,
}

impl SyntheticDecoder {
    /// A 4x2, 25 fps source that declares and decodes `frames` frames.
    pub fn new(frames: u64) -> Self {
        Self {
            declared_frames: frames,
            decodable_frames: frames,
            materializable_frames: None,
            width: 4,
            height: 2,
            frames_per_second: 25.0,
            order: ChannelOrder::Rgb,
            head_readable: true,
            rewind_fails_after: None,
            materialization_fails: false,
            position: 0,
            seeks: 0,
            reads: 0,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Only the first `frames` frames decode through seek + read; full
    /// decoding yields the same number unless
    /// [`with_materializable_frames`](Self::with_materializable_frames)
    /// says otherwise.
    #[must_use]
    pub fn with_decodable_frames(mut self, frames: u64) -> Self {
        self.decodable_frames = frames;
        self
    }

    /// Number of frames a full decode yields.
    #[must_use]
    pub fn with_materializable_frames(mut self, frames: u64) -> Self {
        self.materializable_frames = Some(frames);
        self
    }

    /// Frame dimensions in pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reported [`CaptureProperty::Fps`].
    #[must_use]
    pub fn with_fps(mut self, frames_per_second: f64) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    /// Channel order frames are produced in.
    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    /// Seeking to frame 0 succeeds but the read that follows does not.
    #[must_use]
    pub fn with_unreadable_head(mut self) -> Self {
        self.head_readable = false;
        self
    }

    /// Once `seeks` seeks have been issued, seeking to frame 0 fails and
    /// leaves the position untouched. Other targets keep working.
    #[must_use]
    pub fn with_failing_rewind_after(mut self, seeks: u64) -> Self {
        self.rewind_fails_after = Some(seeks);
        self
    }

    /// [`decode_all`](FrameDecoder::decode_all) fails.
    #[must_use]
    pub fn with_failing_materialization(mut self) -> Self {
        self.materialization_fails = true;
        self
    }

    /// Number of [`seek`](FrameDecoder::seek) calls so far.
    pub fn seek_count(&self) -> u64 {
        self.seeks
    }

    /// Number of [`read`](FrameDecoder::read) calls so far.
    pub fn read_count(&self) -> u64 {
        self.reads
    }

    /// Handle that outlives moving the decoder into a capture.
    pub fn release_tracker(&self) -> ReleaseTracker {
        ReleaseTracker(Arc::clone(&self.released))
    }

    /// The canonical (RGB) value of pixel `(x, y)` in frame `index`.
    pub fn expected_pixel(index: u64, x: u32, y: u32) -> [u8; 3] {
        [(index % 256) as u8, (x % 256) as u8, (y % 256) as u8]
    }

    fn render(&self, index: u64) -> Frame {
        let mut data = Vec::with_capacity((self.width * self.height) as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                data.extend_from_slice(&Self::expected_pixel(index, x, y));
            }
        }
        Frame::new(data, self.width, self.height, index, ChannelOrder::Rgb).into_order(self.order)
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl FrameDecoder for SyntheticDecoder {
    fn is_open(&self) -> bool {
        !self.is_released()
    }

    fn property(&self, property: CaptureProperty) -> f64 {
        if self.is_released() {
            return 0.0;
        }
        match property {
            CaptureProperty::FrameCount => self.declared_frames as f64,
            CaptureProperty::Width => self.width as f64,
            CaptureProperty::Height => self.height as f64,
            CaptureProperty::Fps => self.frames_per_second,
            CaptureProperty::PosFrames => self.position as f64,
            CaptureProperty::PosMsec => {
                if self.frames_per_second > 0.0 {
                    self.position as f64 / self.frames_per_second * 1000.0
                } else {
                    0.0
                }
            }
            CaptureProperty::PosRatio => {
                if self.declared_frames > 0 {
                    self.position as f64 / self.declared_frames as f64
                } else {
                    0.0
                }
            }
        }
    }

    fn seek(&mut self, frame_index: u64) -> bool {
        if self.is_released() {
            return false;
        }
        let refused = frame_index == 0
            && self
                .rewind_fails_after
                .is_some_and(|after| self.seeks >= after);
        self.seeks += 1;
        if refused {
            return false;
        }
        self.position = frame_index;
        true
    }

    fn read(&mut self) -> Option<Frame> {
        if self.is_released() {
            return None;
        }
        self.reads += 1;
        if self.position >= self.decodable_frames {
            return None;
        }
        if self.position == 0 && !self.head_readable {
            return None;
        }
        let frame = self.render(self.position);
        self.position += 1;
        Some(frame)
    }

    fn decode_all(
        &mut self,
        on_frame: &mut dyn FnMut(&Frame),
    ) -> Result<Vec<Frame>, CaptureError> {
        if self.is_released() {
            return Err(CaptureError::Materialization(
                "decoder has been released".to_string(),
            ));
        }
        if self.materialization_fails {
            return Err(CaptureError::Materialization(
                "synthetic stream is undecodable".to_string(),
            ));
        }
        let total = self.materializable_frames.unwrap_or(self.decodable_frames);
        let mut frames = Vec::with_capacity(total.min(4096) as usize);
        for index in 0..total {
            let frame = self.render(index);
            on_frame(&frame);
            frames.push(frame);
        }
        Ok(frames)
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stop_at_decodable_range() {
        let mut decoder = SyntheticDecoder::new(10).with_decodable_frames(3);
        assert!(decoder.seek(2));
        assert_eq!(decoder.read().map(|frame| frame.index()), Some(2));
        assert!(decoder.read().is_none());
        assert_eq!(decoder.property(CaptureProperty::FrameCount), 10.0);
    }

    #[test]
    fn frames_use_native_order() {
        let mut decoder = SyntheticDecoder::new(3).with_channel_order(ChannelOrder::Bgr);
        assert!(decoder.seek(2));
        let frame = decoder.read().expect("frame");
        assert_eq!(frame.channel_order(), ChannelOrder::Bgr);
        assert_eq!(frame.pixel(1, 0), Some([0, 1, 2]));
    }

    #[test]
    fn late_rewind_is_refused() {
        let mut decoder = SyntheticDecoder::new(10).with_failing_rewind_after(1);
        assert!(decoder.seek(0));
        assert!(decoder.seek(9));
        assert!(!decoder.seek(0));
        assert_eq!(decoder.property(CaptureProperty::PosFrames), 9.0);
        assert!(decoder.seek(4));
        assert_eq!(decoder.seek_count(), 4);
    }

    #[test]
    fn reads_are_counted_even_when_empty() {
        let mut decoder = SyntheticDecoder::new(2).with_fps(50.0);
        assert!(decoder.read().is_some());
        assert!((decoder.property(CaptureProperty::PosMsec) - 20.0).abs() < 1e-9);
        assert!(decoder.read().is_some());
        assert!(decoder.read().is_none());
        assert_eq!(decoder.read_count(), 3);
    }

    #[test]
    fn release_is_observable_through_tracker() {
        let mut decoder = SyntheticDecoder::new(3);
        let tracker = decoder.release_tracker();
        assert!(!tracker.is_released());
        decoder.release();
        assert!(tracker.is_released());
        assert!(!decoder.is_open());
        assert_eq!(decoder.property(CaptureProperty::Width), 0.0);
    }
}
