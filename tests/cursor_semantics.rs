//! Sequential cursor behaviour of the two backends.
//!
//! Indexed random access moves the decoder, so sequential reading resumes
//! after the frame just read. Materialized random access is a lookup that
//! leaves the sequential cursor alone.

use delogo_capture::{
    BackendMode, CaptureOptions, CaptureProperty, ChannelOrder, SyntheticDecoder, VideoCapture,
};

fn indexed(frames: u64) -> VideoCapture<SyntheticDecoder> {
    let capture = VideoCapture::from_decoder(SyntheticDecoder::new(frames), &CaptureOptions::default())
        .expect("Failed to build capture");
    assert_eq!(capture.mode(), BackendMode::Indexed);
    capture
}

fn materialized(frames: u64) -> VideoCapture<SyntheticDecoder> {
    let capture = VideoCapture::from_decoder(
        SyntheticDecoder::new(frames),
        &CaptureOptions::new().with_forced_mode(BackendMode::Materialized),
    )
    .expect("Failed to build capture");
    assert_eq!(capture.mode(), BackendMode::Materialized);
    capture
}

#[test]
fn indexed_read_continues_after_random_access() {
    let mut capture = indexed(30);
    assert_eq!(capture.read_at(10).map(|frame| frame.index()), Some(10));
    assert_eq!(capture.read().map(|frame| frame.index()), Some(11));
    assert_eq!(capture.get(CaptureProperty::PosFrames), 12.0);
}

#[test]
fn materialized_read_ignores_random_access() {
    let mut capture = materialized(30);
    assert_eq!(capture.read_at(10).map(|frame| frame.index()), Some(10));
    assert_eq!(capture.read().map(|frame| frame.index()), Some(0));
    assert_eq!(capture.read().map(|frame| frame.index()), Some(1));
}

#[test]
fn sequential_reads_start_at_zero_after_probing() {
    let mut capture = indexed(5);
    let indices: Vec<u64> = capture.frames().map(|frame| frame.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert!(capture.read().is_none());
}

#[test]
fn materialized_cursor_stays_exhausted() {
    let mut capture = materialized(3);
    assert_eq!(capture.frames().count(), 3);
    assert!(capture.read().is_none());
    assert!(capture.read().is_none());
    assert_eq!(capture.read_at(2).map(|frame| frame.index()), Some(2));
}

#[test]
fn set_and_read_matches_read_at() {
    let mut capture = materialized(12);
    let by_position = capture
        .set_and_read(CaptureProperty::PosFrames, 7.0)
        .expect("frame positions are accepted")
        .expect("frame 7 exists");
    let by_index = capture.read_at(7).expect("frame 7 exists");
    assert_eq!(by_position, by_index);

    for property in [
        CaptureProperty::PosMsec,
        CaptureProperty::PosRatio,
        CaptureProperty::FrameCount,
    ] {
        assert!(capture.set_and_read(property, 1.0).is_err());
    }
    assert!(
        capture
            .set_and_read(CaptureProperty::PosFrames, f64::NAN)
            .expect("frame positions are accepted")
            .is_none()
    );
}

#[test]
fn get_is_idempotent() {
    for mut capture in [indexed(25), materialized(25)] {
        for property in [
            CaptureProperty::FrameCount,
            CaptureProperty::Width,
            CaptureProperty::Height,
            CaptureProperty::Fps,
            CaptureProperty::PosFrames,
            CaptureProperty::PosMsec,
        ] {
            assert_eq!(capture.get(property), capture.get(property));
        }
        assert_eq!(capture.get(CaptureProperty::Width), 4.0);
        assert_eq!(capture.get(CaptureProperty::Height), 2.0);
        assert_eq!(capture.get(CaptureProperty::Fps), 25.0);
        let _ = capture.read();
        assert_eq!(capture.get(CaptureProperty::FrameCount), 25.0);
    }
}

#[test]
fn frames_are_normalized_to_rgb_in_both_backends() {
    for mode in [BackendMode::Indexed, BackendMode::Materialized] {
        let mut capture = VideoCapture::from_decoder(
            SyntheticDecoder::new(8)
                .with_size(3, 3)
                .with_channel_order(ChannelOrder::Bgr),
            &CaptureOptions::new().with_forced_mode(mode),
        )
        .expect("Failed to build capture");

        let frame = capture.read_at(5).expect("frame 5 exists");
        assert_eq!(frame.channel_order(), ChannelOrder::Rgb);
        assert_eq!(frame.data().len(), 3 * 3 * 3);
        assert_eq!(frame.pixel(2, 1), Some(SyntheticDecoder::expected_pixel(5, 2, 1)));

        let sequential = capture.read().expect("a sequential frame exists");
        assert_eq!(sequential.channel_order(), ChannelOrder::Rgb);
    }
}
