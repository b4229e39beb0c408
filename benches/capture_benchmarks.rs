//! Benchmarks for probing, seek search, and capture reads.
//!
//! Run with: cargo bench --features testing
//!
//! The synthetic benchmarks always run. The FFmpeg benchmarks require
//! fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use delogo_capture::{
    BackendMode, CaptureOptions, CaptureProbe, FfmpegLogLevel, ProbeStrategy, SyntheticDecoder,
    VideoCapture, find_last_readable_frame, probe_indexed_access,
};

const INTACT: &str = "tests/fixtures/intact_100.mp4";
const TRUNCATED: &str = "tests/fixtures/truncated_100.mp4";

fn benchmark_synthetic_probe_and_search(criterion: &mut Criterion) {
    criterion.bench_function("probe intact synthetic source", |bencher| {
        bencher.iter(|| {
            let mut decoder = SyntheticDecoder::new(10_000).with_size(64, 36);
            black_box(probe_indexed_access(&mut decoder, ProbeStrategy::HeadAndTail));
        });
    });

    criterion.bench_function("seek search over 1M declared frames", |bencher| {
        bencher.iter(|| {
            let mut decoder = SyntheticDecoder::new(1_000_000)
                .with_decodable_frames(654_321)
                .with_size(8, 8);
            black_box(find_last_readable_frame(&mut decoder, 1_000_000));
        });
    });
}

fn benchmark_synthetic_backends(criterion: &mut Criterion) {
    for mode in [BackendMode::Indexed, BackendMode::Materialized] {
        criterion.bench_function(&format!("open + read 250 frames ({mode:?})"), |bencher| {
            bencher.iter(|| {
                let mut capture = VideoCapture::from_decoder(
                    SyntheticDecoder::new(250).with_size(64, 36),
                    &CaptureOptions::new().with_forced_mode(mode),
                )
                .unwrap();
                black_box(capture.frames().count());
            });
        });
    }
}

fn benchmark_ffmpeg_captures(criterion: &mut Criterion) {
    delogo_capture::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(INTACT).exists() {
        eprintln!("Skipping FFmpeg benchmarks: fixture not found");
        return;
    }

    criterion.bench_function("probe intact file", |bencher| {
        bencher.iter(|| {
            black_box(CaptureProbe::probe(INTACT, ProbeStrategy::HeadAndTail).unwrap());
        });
    });

    criterion.bench_function("open intact file + read frame 75", |bencher| {
        bencher.iter(|| {
            let mut capture = VideoCapture::open(INTACT).unwrap();
            black_box(capture.read_at(75).unwrap());
        });
    });

    if Path::new(TRUNCATED).exists() {
        criterion.bench_function("open truncated file (materialize)", |bencher| {
            bencher.iter(|| {
                let capture = VideoCapture::open(TRUNCATED).unwrap();
                black_box(capture.frame_count());
            });
        });
    }
}

criterion::criterion_group!(
    benches,
    benchmark_synthetic_probe_and_search,
    benchmark_synthetic_backends,
    benchmark_ffmpeg_captures,
);
criterion::criterion_main!(benches);
