//! FFmpeg-backed captures over generated fixtures.
//!
//! Run `tests/fixtures/generate_fixtures.sh` first; every test here returns
//! early when its fixture is missing.

use std::path::Path;

use delogo_capture::{
    BackendMode, CaptureOptions, CaptureProbe, CaptureProperty, ChannelOrder, FfmpegDecoder,
    FrameDecoder, ProbeStrategy, VideoCapture,
};

const INTACT: &str = "tests/fixtures/intact_100.mp4";
const TRUNCATED: &str = "tests/fixtures/truncated_100.mp4";

fn fixture(path: &str) -> Option<&Path> {
    let path = Path::new(path);
    path.exists().then_some(path)
}

#[test]
fn intact_file_is_read_by_seeking() {
    let Some(path) = fixture(INTACT) else {
        return;
    };

    let mut capture = VideoCapture::open(path).expect("Failed to open intact fixture");
    assert_eq!(capture.mode(), BackendMode::Indexed);
    assert!(capture.is_open());
    assert_eq!(capture.frame_count(), 100);
    assert_eq!(capture.get(CaptureProperty::Width), 320.0);
    assert_eq!(capture.get(CaptureProperty::Height), 240.0);
    assert!((capture.get(CaptureProperty::Fps) - 25.0).abs() < 1e-6);

    let metadata = capture.metadata();
    assert_eq!(metadata.frame_count, 100);
    assert_eq!(metadata.codec, "mpeg4");

    let last = capture.read_at(99).expect("last frame should decode");
    assert_eq!(last.index(), 99);
    assert_eq!((last.width(), last.height()), (320, 240));
    assert_eq!(last.data().len(), 320 * 240 * 3);
    assert_eq!(last.channel_order(), ChannelOrder::Rgb);

    let middle = capture.read_at(53).expect("frame 53 should decode");
    assert_eq!(middle.index(), 53);
    assert_eq!(capture.read().map(|frame| frame.index()), Some(54));
}

#[test]
fn intact_file_reads_sequentially_to_the_end() {
    let Some(path) = fixture(INTACT) else {
        return;
    };

    let mut capture = VideoCapture::open(path).expect("Failed to open intact fixture");
    let indices: Vec<u64> = capture.frames().map(|frame| frame.index()).collect();
    assert_eq!(indices.len(), 100);
    assert_eq!(indices.first(), Some(&0));
    assert_eq!(indices.last(), Some(&99));

    assert!(capture.read().is_none());
    assert!(capture.read().is_none());
}

#[test]
fn bgr_decoding_is_normalized() {
    let Some(path) = fixture(INTACT) else {
        return;
    };

    let mut rgb = VideoCapture::open(path).expect("Failed to open intact fixture");
    let mut bgr = VideoCapture::open_with_options(
        path,
        &CaptureOptions::new().with_channel_order(ChannelOrder::Bgr),
    )
    .expect("Failed to open intact fixture");

    let from_rgb = rgb.read_at(20).expect("frame 20");
    let from_bgr = bgr.read_at(20).expect("frame 20");
    assert_eq!(bgr.decoder().channel_order(), ChannelOrder::Bgr);
    assert_eq!(from_bgr.channel_order(), ChannelOrder::Rgb);
    assert_eq!(from_rgb.data(), from_bgr.data());
}

#[test]
fn truncated_file_is_materialized() {
    let Some(path) = fixture(TRUNCATED) else {
        return;
    };

    let mut capture = VideoCapture::open(path).expect("Failed to open truncated fixture");
    assert_eq!(capture.mode(), BackendMode::Materialized);
    assert!(!capture.probe_report().tail_readable);
    assert_eq!(capture.metadata().frame_count, 100);

    let available = capture.frame_count();
    assert!(available > 0 && available < 100, "{available} frames decoded");
    assert!(!capture.is_open());

    let last = capture
        .read_at(available - 1)
        .expect("last decoded frame should be served from memory");
    assert_eq!(last.index(), available - 1);
    assert!(capture.read_at(available).is_none());
}

#[test]
fn probe_without_capture() {
    if let Some(path) = fixture(INTACT) {
        let report =
            CaptureProbe::probe(path, ProbeStrategy::HeadAndTail).expect("probe intact fixture");
        assert!(report.trusted);
        assert_eq!(report.declared_frame_count, 100);
    }

    if let Some(path) = fixture(TRUNCATED) {
        let (report, search) = CaptureProbe::probe_with_search(path, ProbeStrategy::TailOnly)
            .expect("probe truncated fixture");
        assert!(!report.trusted);
        let search = search.expect("untrusted files are searched");
        assert!(search.last_readable < 99);
        assert!(search.probes <= 7);
    }
}

#[test]
fn decoder_release_zeroes_properties() {
    let Some(path) = fixture(INTACT) else {
        return;
    };

    let mut decoder = FfmpegDecoder::open(path, ChannelOrder::Rgb).expect("open decoder");
    assert!(decoder.is_open());
    assert_eq!(decoder.property(CaptureProperty::FrameCount), 100.0);
    decoder.release();
    assert!(!decoder.is_open());
    assert_eq!(decoder.property(CaptureProperty::FrameCount), 0.0);
    assert!(decoder.read().is_none());
    assert!(!decoder.seek(0));
}
