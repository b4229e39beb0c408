//! Progress reporting for materialization.
//!
//! Fully decoding a stream can take a while, so
//! [`CaptureOptions::with_progress`](crate::CaptureOptions::with_progress)
//! accepts a [`ProgressCallback`] that observes each decoded frame. There is
//! no cancellation: a caller that wants out drops or releases the capture.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use delogo_capture::{CaptureOptions, ProgressCallback, ProgressInfo, VideoCapture};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% decoded", info.operation);
//!         }
//!     }
//! }
//!
//! let options = CaptureOptions::new().with_progress(Arc::new(PrintProgress));
//! let capture = VideoCapture::open_with_options("input.mp4", &options)?;
//! # Ok::<(), delogo_capture::CaptureError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding the full stream into memory.
    Materialization,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many frames have been processed so far.
    pub current: u64,
    /// Frames expected, if known. For materialization this is the declared
    /// count, which the real count may undershoot.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The frame index last processed.
    pub current_frame: Option<u64>,
}

/// Receives progress updates. Callbacks observe but cannot halt the
/// operation.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing and emits callbacks at the configured cadence.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed frame.
    pub(crate) fn advance(&mut self, frame_index: Option<u64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_index);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_index: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                let per_item = elapsed / self.current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(u64, Option<f32>)>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen
                .lock()
                .unwrap()
                .push((info.current, info.percentage));
        }
    }

    #[test]
    fn reports_every_batch_and_on_finish() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::Materialization, Some(10), 4);
        for index in 0..10 {
            tracker.advance(Some(index));
        }
        tracker.finish();

        let seen = recorder.seen.lock().unwrap();
        let currents: Vec<u64> = seen.iter().map(|(current, _)| *current).collect();
        assert_eq!(currents, vec![4, 8, 10]);
        assert_eq!(seen.last().unwrap().1, Some(100.0));
    }

    #[test]
    fn percentage_is_capped_when_total_overstates() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::Materialization, Some(2), 1);
        for index in 0..3 {
            tracker.advance(Some(index));
        }
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.last().unwrap().1, Some(100.0));
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::Materialization, None, 0);
        tracker.advance(None);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }
}
