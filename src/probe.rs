//! Empirical trust check for indexed seeking.
//!
//! Container metadata is not evidence that a frame can be reached by seeking.
//! [`probe_indexed_access`] asks the decoder directly: seek to the last
//! declared frame and read it, then (with [`ProbeStrategy::HeadAndTail`])
//! do the same for frame 0. The verdict is a plain [`ProbeReport`]; a failed
//! probe is the expected trigger for materialization, not an error.
//!
//! [`CaptureProbe`] runs the same check against a file without keeping a
//! capture around, which is handy for triaging many files.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

use crate::decoder::{FrameDecoder, declared_frame_count, seek_and_read};
use crate::error::CaptureError;
use crate::ffmpeg_decoder::FfmpegDecoder;
use crate::frame::ChannelOrder;
use crate::seek_finder::{SeekSearch, find_last_readable_frame};

/// Which boundary frames must be readable for indexed seeking to be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// Only the last declared frame is checked.
    TailOnly,
    /// Both the last declared frame and frame 0 are checked. This is the
    /// default.
    #[default]
    HeadAndTail,
}

impl FromStr for ProbeStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "tail" | "tail-only" => Ok(ProbeStrategy::TailOnly),
            "head-tail" | "head-and-tail" | "both" => Ok(ProbeStrategy::HeadAndTail),
            other => Err(format!("unknown probe strategy: {other}")),
        }
    }
}

/// Outcome of probing a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ProbeReport {
    /// Frame count the container declared when the probe ran.
    pub declared_frame_count: u64,
    /// Whether seeking to `declared_frame_count - 1` produced a frame.
    pub tail_readable: bool,
    /// Whether seeking to frame 0 produced a frame. `None` when the strategy
    /// skips this check.
    pub head_readable: Option<bool>,
    /// Whether the decoder was seeked back to frame 0 once the reads were
    /// done. A decoder left elsewhere is never trusted.
    pub rewound: bool,
    /// Whether indexed seeking can be trusted for this source.
    pub trusted: bool,
}

impl Display for ProbeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let head = match self.head_readable {
            Some(true) => "readable",
            Some(false) => "unreadable",
            None => "unchecked",
        };
        write!(
            f,
            "{} declared frames, tail {}, head {}{}: {}",
            self.declared_frame_count,
            if self.tail_readable { "readable" } else { "unreadable" },
            head,
            if self.rewound { "" } else { ", rewind failed" },
            if self.trusted { "trusted" } else { "untrusted" },
        )
    }
}

/// Probe whether indexed seeking on `decoder` can be trusted.
///
/// Whatever the outcome, the decoder is seeked back to frame 0, so the probe
/// has no effect on a subsequent sequential read. If that rewind fails the
/// report is untrusted, which sends the capture to the in-memory backend. A
/// declared count of zero is untrusted without issuing any seek.
pub fn probe_indexed_access<D: FrameDecoder + ?Sized>(
    decoder: &mut D,
    strategy: ProbeStrategy,
) -> ProbeReport {
    let declared = declared_frame_count(decoder);
    if declared == 0 {
        log::debug!("Indexed access probe: no frames declared, untrusted");
        return ProbeReport {
            declared_frame_count: 0,
            tail_readable: false,
            head_readable: None,
            rewound: true,
            trusted: false,
        };
    }

    let tail_readable = seek_and_read(decoder, declared - 1).is_some();
    let head_readable = match strategy {
        ProbeStrategy::TailOnly => None,
        ProbeStrategy::HeadAndTail => Some(seek_and_read(decoder, 0).is_some()),
    };

    let rewound = decoder.seek(0);
    if !rewound {
        log::debug!("Failed to rewind decoder to frame 0 after probing");
    }

    let report = ProbeReport {
        declared_frame_count: declared,
        tail_readable,
        head_readable,
        rewound,
        trusted: tail_readable && head_readable.unwrap_or(true) && rewound,
    };
    log::debug!("Indexed access probe: {report}");
    report
}

/// Lightweight probe that does not keep the file open.
///
/// # Example
///
/// ```no_run
/// use delogo_capture::{CaptureProbe, ProbeStrategy};
///
/// let report = CaptureProbe::probe("input.mp4", ProbeStrategy::HeadAndTail)?;
/// if !report.trusted {
///     println!("indexed seeking is unreliable: {report}");
/// }
/// # Ok::<(), delogo_capture::CaptureError>(())
/// ```
pub struct CaptureProbe;

impl CaptureProbe {
    /// Open `path`, probe it, and close it again.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::FileOpen`] or [`CaptureError::NoVideoStream`]
    /// if the file cannot be opened as a video. Probe failures are reported
    /// in the returned [`ProbeReport`], never as errors.
    pub fn probe<P: AsRef<Path>>(
        path: P,
        strategy: ProbeStrategy,
    ) -> Result<ProbeReport, CaptureError> {
        let mut decoder = FfmpegDecoder::open(path, ChannelOrder::CANONICAL)?;
        let report = probe_indexed_access(&mut decoder, strategy);
        decoder.release();
        Ok(report)
    }

    /// Probe `path` and, if indexed seeking is untrusted, also binary-search
    /// the last frame that still reads.
    pub fn probe_with_search<P: AsRef<Path>>(
        path: P,
        strategy: ProbeStrategy,
    ) -> Result<(ProbeReport, Option<SeekSearch>), CaptureError> {
        let mut decoder = FfmpegDecoder::open(path, ChannelOrder::CANONICAL)?;
        let report = probe_indexed_access(&mut decoder, strategy);
        let search = (!report.trusted)
            .then(|| find_last_readable_frame(&mut decoder, report.declared_frame_count));
        decoder.release();
        Ok((report, search))
    }

    /// Probe several files. Files that cannot be opened produce an `Err`
    /// entry instead of aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(
        paths: &[P],
        strategy: ProbeStrategy,
    ) -> Vec<Result<ProbeReport, CaptureError>> {
        paths
            .iter()
            .map(|path| Self::probe(path, strategy))
            .collect()
    }
}
