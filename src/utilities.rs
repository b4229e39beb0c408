//! Internal utility functions.
//!
//! Pixel-plane copying and the frame-index/timestamp arithmetic shared by the
//! FFmpeg decoder.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

use crate::frame::CHANNELS;

/// Copy a packed 3-channel FFmpeg frame into a tightly packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// This strips the padding so the buffer can back a [`crate::Frame`].
pub(crate) fn frame_to_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * CHANNELS;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Map a PTS value to a frame index, relative to the stream start.
///
/// Rounds to the nearest frame: `0.04 * 25.0` must land on frame 1, not 0.
pub(crate) fn pts_to_frame_index(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let seconds = pts_to_seconds(pts.saturating_sub(start_pts), time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Convert a frame index to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` seeks across all streams (`stream_index = -1`), which
/// expects AV_TIME_BASE units rather than the stream time base.
pub(crate) fn frame_index_to_seek_timestamp(frame_index: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_index as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Time at which `frame_index` is presented.
///
/// `None` when the frame rate is not a positive finite number, or when the
/// result does not fit in a [`Duration`].
pub fn frame_index_to_duration(frame_index: u64, frames_per_second: f64) -> Option<Duration> {
    frame_position_to_duration(frame_index as f64, frames_per_second)
}

/// Time of a possibly fractional frame position. Negative positions clamp
/// to zero.
pub(crate) fn frame_position_to_duration(
    position: f64,
    frames_per_second: f64,
) -> Option<Duration> {
    if !position.is_finite() || !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64((position / frames_per_second).max(0.0)).ok()
}

/// Estimate a frame count from a container duration.
pub(crate) fn estimate_frame_count(duration: Duration, frames_per_second: f64) -> u64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    (duration.as_secs_f64() * frames_per_second).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_rounds_to_nearest_frame() {
        let time_base = Rational::new(1, 1000);
        assert_eq!(pts_to_frame_index(40, 0, time_base, 25.0), 1);
        assert_eq!(pts_to_frame_index(39, 0, time_base, 25.0), 1);
        assert_eq!(pts_to_frame_index(3960, 0, time_base, 25.0), 99);
    }

    #[test]
    fn pts_is_relative_to_stream_start() {
        let time_base = Rational::new(1, 90_000);
        assert_eq!(pts_to_frame_index(3600 + 1800, 1800, time_base, 25.0), 1);
        assert_eq!(pts_to_frame_index(900, 1800, time_base, 25.0), 0);
    }

    #[test]
    fn seek_timestamps_are_microseconds() {
        assert_eq!(frame_index_to_seek_timestamp(25, 25.0), 1_000_000);
        assert_eq!(frame_index_to_seek_timestamp(10, 0.0), 0);
    }

    #[test]
    fn durations_follow_frame_rate() {
        assert_eq!(frame_index_to_duration(50, 25.0), Some(Duration::from_secs(2)));
        assert_eq!(frame_index_to_duration(50, 0.0), None);
        assert_eq!(estimate_frame_count(Duration::from_secs(4), 25.0), 100);
        assert_eq!(estimate_frame_count(Duration::from_secs(4), 0.0), 0);
    }

    #[test]
    fn out_of_range_durations_are_none() {
        assert_eq!(frame_index_to_duration(u64::MAX, f64::MIN_POSITIVE), None);
        assert_eq!(frame_index_to_duration(1, f64::INFINITY), None);
        assert_eq!(frame_position_to_duration(f64::INFINITY, 25.0), None);
        assert_eq!(frame_position_to_duration(f64::NAN, 25.0), None);
        assert_eq!(frame_position_to_duration(-10.0, 25.0), Some(Duration::ZERO));
    }
}
