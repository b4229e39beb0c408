//! Binary search for the last frame that still reads.
//!
//! When the declared frame count overstates what decodes, the true tail can
//! be located in `O(log2(n))` seek + read operations instead of a linear scan.
//! The result is diagnostic only. A corrected count says nothing about
//! whether every earlier frame is independently seekable, so captures still
//! materialize untrusted sources rather than trusting this number.

use crate::decoder::{FrameDecoder, seek_and_read};
use crate::property::CaptureProperty;

/// Upper bound on search iterations. `u64` indices need at most 64 halvings.
pub const MAX_SEARCH_ITERATIONS: u32 = 64;

/// Result of [`find_last_readable_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SeekSearch {
    /// Largest frame index at which seek + read succeeded. This is the lower
    /// bound of the search, so it is `0` both when only frame 0 reads and
    /// when nothing reads at all.
    pub last_readable: u64,
    /// Number of seek + read probes issued.
    pub probes: u32,
}

impl SeekSearch {
    /// Frame count implied by the search.
    pub fn frame_count(&self) -> u64 {
        self.last_readable + 1
    }
}

/// Binary-search `[0, declared_count]` for the last readable frame.
///
/// At each step the midpoint is probed: a successful read moves the lower
/// bound up, a failed one moves the upper bound down. The loop stops once
/// fewer than two candidates remain, or after [`MAX_SEARCH_ITERATIONS`].
/// The decoder is repositioned to where it was before the search.
pub fn find_last_readable_frame<D: FrameDecoder + ?Sized>(
    decoder: &mut D,
    declared_count: u64,
) -> SeekSearch {
    let origin = decoder.property(CaptureProperty::PosFrames).max(0.0) as u64;

    let mut start = 0_u64;
    let mut end = declared_count;
    let mut probes = 0_u32;

    while end - start >= 2 && probes < MAX_SEARCH_ITERATIONS {
        let mid = start + (end - start) / 2;
        probes += 1;
        if seek_and_read(decoder, mid).is_some() {
            start = mid;
        } else {
            end = mid;
        }
    }

    if !decoder.seek(origin) {
        log::debug!("Failed to restore decoder position {origin} after seek search");
    }

    log::debug!(
        "Seek search over {declared_count} declared frames: last readable {start} after {probes} probes"
    );
    SeekSearch {
        last_readable: start,
        probes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticDecoder;

    fn ceil_log2(value: u64) -> u32 {
        64 - (value - 1).leading_zeros()
    }

    #[test]
    fn finds_truncated_tail_within_log_probes() {
        let mut decoder = SyntheticDecoder::new(100).with_decodable_frames(80);
        let search = find_last_readable_frame(&mut decoder, 100);
        assert!(
            search.last_readable == 79 || search.last_readable == 80,
            "got {}",
            search.last_readable
        );
        assert!(search.probes <= ceil_log2(100), "{} probes", search.probes);
        assert_eq!(decoder.seek_count() as u32, search.probes + 1);
    }

    #[test]
    fn intact_source_reports_last_declared_frame() {
        let mut decoder = SyntheticDecoder::new(100);
        let search = find_last_readable_frame(&mut decoder, 100);
        assert_eq!(search.last_readable, 99);
        assert_eq!(search.frame_count(), 100);
    }

    #[test]
    fn tiny_ranges_issue_no_probes() {
        let mut decoder = SyntheticDecoder::new(1);
        assert_eq!(
            find_last_readable_frame(&mut decoder, 1),
            SeekSearch {
                last_readable: 0,
                probes: 0
            }
        );
        assert_eq!(find_last_readable_frame(&mut decoder, 0).probes, 0);
    }

    #[test]
    fn search_restores_decoder_position() {
        let mut decoder = SyntheticDecoder::new(60).with_decodable_frames(40);
        assert!(decoder.seek(12));
        let _ = find_last_readable_frame(&mut decoder, 60);
        assert_eq!(decoder.read().map(|frame| frame.index()), Some(12));
    }

    #[test]
    fn huge_declarations_stay_bounded() {
        let mut decoder = SyntheticDecoder::new(u64::MAX).with_decodable_frames(3);
        let search = find_last_readable_frame(&mut decoder, u64::MAX);
        assert_eq!(search.last_readable, 2);
        assert!(search.probes <= MAX_SEARCH_ITERATIONS);
    }
}
