//! Capture configuration.
//!
//! [`CaptureOptions`] is a builder that threads the probe strategy, decoder
//! settings, and progress reporting through
//! [`VideoCapture::open_with_options`](crate::VideoCapture::open_with_options)
//! and [`VideoCapture::from_decoder`](crate::VideoCapture::from_decoder).
//!
//! # Example
//!
//! ```no_run
//! use delogo_capture::{CaptureOptions, ProbeStrategy, VideoCapture};
//!
//! let options = CaptureOptions::new()
//!     .with_probe_strategy(ProbeStrategy::TailOnly)
//!     .with_seek_diagnostics(true);
//! let capture = VideoCapture::open_with_options("input.mp4", &options)?;
//! println!("backend: {:?}", capture.mode());
//! # Ok::<(), delogo_capture::CaptureError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::frame::ChannelOrder;
use crate::probe::ProbeStrategy;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::source::BackendMode;

/// Settings for opening a capture.
///
/// A default-constructed value probes head and tail, decodes in canonical
/// order, skips seek diagnostics, and reports no progress.
#[derive(Clone)]
pub struct CaptureOptions {
    pub(crate) probe_strategy: ProbeStrategy,
    /// Channel order the FFmpeg decoder converts into. Frames are normalized
    /// to canonical order before reaching callers either way.
    pub(crate) channel_order: ChannelOrder,
    /// Binary-search the last readable frame when the probe fails.
    pub(crate) seek_diagnostics: bool,
    /// Skip the probe verdict and use this backend.
    pub(crate) forced_mode: Option<BackendMode>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Fire the progress callback every N decoded frames.
    pub(crate) batch_size: u64,
}

impl Debug for CaptureOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptureOptions")
            .field("probe_strategy", &self.probe_strategy)
            .field("channel_order", &self.channel_order)
            .field("seek_diagnostics", &self.seek_diagnostics)
            .field("forced_mode", &self.forced_mode)
            .field("has_progress", &true)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            probe_strategy: ProbeStrategy::default(),
            channel_order: ChannelOrder::CANONICAL,
            seek_diagnostics: false,
            forced_mode: None,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Which boundary frames the probe reads.
    #[must_use]
    pub fn with_probe_strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.probe_strategy = strategy;
        self
    }

    /// Channel order the FFmpeg decoder produces natively.
    ///
    /// Ignored by [`VideoCapture::from_decoder`](crate::VideoCapture::from_decoder),
    /// whose decoder already has an order.
    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// When indexed seeking is untrusted, also locate the last readable
    /// frame and log it. Costs `O(log2(n))` extra seeks at open.
    #[must_use]
    pub fn with_seek_diagnostics(mut self, enabled: bool) -> Self {
        self.seek_diagnostics = enabled;
        self
    }

    /// Use `mode` regardless of the probe verdict. The probe still runs and
    /// its report is still available.
    #[must_use]
    pub fn with_forced_mode(mut self, mode: BackendMode) -> Self {
        self.forced_mode = Some(mode);
        self
    }

    /// Attach a progress callback for materialization.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn probe_strategy(&self) -> ProbeStrategy {
        self.probe_strategy
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    pub fn forced_mode(&self) -> Option<BackendMode> {
        self.forced_mode
    }
}
