use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use delogo_capture::{
    BackendMode, CaptureOptions, CaptureProbe, FfmpegLogLevel, ProbeReport, ProbeStrategy,
    ProgressCallback, ProgressInfo, SeekSearch, VideoCapture,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  delogo-capture info input.mp4 --json\n  delogo-capture probe a.mp4 b.mp4 --search\n  delogo-capture frame input.mp4 --index 120 --out frame.png\n  delogo-capture sample input.mp4 --out frames --count 10 --progress\n  delogo-capture completions zsh > _delogo-capture";

#[derive(Debug, Parser)]
#[command(
    name = "delogo-capture",
    version,
    about = "Frame-accurate reading of videos with unreliable metadata",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while a stream is decoded into memory.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Boundary frames checked before trusting seeks (tail, head-tail).
    #[arg(long)]
    probe_strategy: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print stream properties and the backend a capture would use.
    #[command(
        about = "Print capture information",
        after_help = "Examples:\n  delogo-capture info input.mp4\n  delogo-capture info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether seeking by frame index works, without decoding into memory.
    #[command(
        about = "Probe indexed seeking",
        after_help = "Examples:\n  delogo-capture probe input.mp4\n  delogo-capture probe *.mp4 --strategy tail --search --json"
    )]
    Probe {
        /// Input video paths.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Overrides --probe-strategy for this command.
        #[arg(long)]
        strategy: Option<String>,

        /// Also locate the last frame reachable by seeking.
        #[arg(long)]
        search: bool,

        #[arg(long)]
        json: bool,
    },

    /// Save a single frame.
    #[command(
        about = "Save one frame",
        after_help = "Examples:\n  delogo-capture frame input.mp4 --index 0 --out first.png"
    )]
    Frame {
        input: PathBuf,
        /// Zero-based frame index.
        #[arg(long)]
        index: u64,
        /// Output image path; the format follows the extension.
        #[arg(long)]
        out: PathBuf,
    },

    /// Save evenly spaced frames to a directory.
    #[command(
        about = "Save evenly spaced frames",
        after_help = "Examples:\n  delogo-capture sample input.mp4 --out frames --count 10 --ext jpg"
    )]
    Sample {
        input: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Number of frames to save.
        #[arg(long, default_value_t = 10)]
        count: u64,
        /// Output image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn parse_probe_strategy(value: &str) -> Option<ProbeStrategy> {
    value.parse().ok()
}

fn parse_image_extension(value: &str) -> Option<&'static str> {
    match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "bmp" => Some("bmp"),
        "tif" | "tiff" => Some("tiff"),
        _ => None,
    }
}

/// Frame indices `step/2, step/2 + step, ...` with `step = max(1, frames / count)`,
/// limited to `count` entries inside `[0, frames)`.
fn sample_positions(frame_count: u64, count: u64) -> Vec<u64> {
    if frame_count == 0 || count == 0 {
        return Vec::new();
    }
    let step = (frame_count / count).max(1);
    (0..count)
        .map(|k| step / 2 + k * step)
        .take_while(|&position| position < frame_count)
        .collect()
}

fn backend_name(mode: BackendMode) -> &'static str {
    match mode {
        BackendMode::Indexed => "indexed",
        BackendMode::Materialized => "materialized",
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn global_probe_strategy(
    global: &GlobalOptions,
) -> Result<ProbeStrategy, Box<dyn std::error::Error>> {
    match &global.probe_strategy {
        Some(value) => Ok(parse_probe_strategy(value)
            .ok_or(format!("unsupported --probe-strategy: {value}"))?),
        None => Ok(ProbeStrategy::default()),
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        delogo_capture::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Drives an indicatif bar from materialization progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message("decoding into memory");
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
    }
}

fn open_capture(
    input: &Path,
    global: &GlobalOptions,
) -> Result<VideoCapture, Box<dyn std::error::Error>> {
    let mut options = CaptureOptions::new()
        .with_probe_strategy(global_probe_strategy(global)?)
        .with_seek_diagnostics(global.verbose);

    let progress = if global.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options
            .with_progress(progress.clone())
            .with_batch_size(10);
        Some(progress)
    } else {
        None
    };

    let capture = VideoCapture::open_with_options(input, &options);
    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }
    let capture = capture?;

    if capture.mode() == BackendMode::Materialized && global.verbose {
        eprintln!(
            "{} {}",
            "note:".cyan().bold(),
            format!(
                "indexed seeking is unreliable for {}; using {} decoded frames",
                input.display(),
                capture.frame_count()
            )
            .cyan()
        );
    }
    Ok(capture)
}

fn probe_json(path: &Path, report: &ProbeReport, search: Option<&SeekSearch>) -> serde_json::Value {
    json!({
        "path": path.display().to_string(),
        "declared_frame_count": report.declared_frame_count,
        "tail_readable": report.tail_readable,
        "head_readable": report.head_readable,
        "rewound": report.rewound,
        "trusted": report.trusted,
        "last_readable_frame": search.map(|search| search.last_readable),
        "search_probes": search.map(|search| search.probes),
    })
}

fn print_probe(path: &Path, report: &ProbeReport, search: Option<&SeekSearch>) {
    let verdict = if report.trusted {
        "trusted".green().bold()
    } else {
        "untrusted".red().bold()
    };
    println!("{}: {verdict}", path.display());
    println!("  {report}");
    if let Some(search) = search {
        println!(
            "  last readable frame: {} ({} probes)",
            search.last_readable, search.probes
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Info { input, json } => {
            let mut capture = open_capture(&input, &cli.global)?;
            let metadata = capture.metadata().clone();
            let report = *capture.probe_report();
            let mode = capture.mode();
            let frame_count = capture.frame_count();
            let last_frame_readable = frame_count
                .checked_sub(1)
                .and_then(|last| capture.read_at(last))
                .is_some();

            if json {
                let payload = json!({
                    "path": metadata.path.display().to_string(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "codec": metadata.codec,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "declared_frame_count": metadata.frame_count,
                    "frame_count": frame_count,
                    "backend": backend_name(mode),
                    "probe": {
                        "tail_readable": report.tail_readable,
                        "head_readable": report.head_readable,
                        "rewound": report.rewound,
                        "trusted": report.trusted,
                    },
                    "last_frame_readable": last_frame_readable,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Frames: {} declared, {} available",
                    metadata.frame_count, frame_count
                );
                println!("Backend: {}", backend_name(mode).bold());
                println!("Probe: {report}");
                println!(
                    "Last frame: {}",
                    if last_frame_readable {
                        "readable".green()
                    } else {
                        "unreadable".red()
                    }
                );
            }
            capture.release();
        }
        Commands::Probe {
            inputs,
            strategy,
            search,
            json,
        } => {
            let strategy = match strategy {
                Some(value) => {
                    parse_probe_strategy(&value).ok_or(format!("unsupported --strategy: {value}"))?
                }
                None => global_probe_strategy(&cli.global)?,
            };

            let results: Vec<_> = if search {
                inputs
                    .iter()
                    .map(|path| CaptureProbe::probe_with_search(path, strategy))
                    .collect()
            } else {
                CaptureProbe::probe_many(&inputs, strategy)
                    .into_iter()
                    .map(|result| result.map(|report| (report, None)))
                    .collect()
            };

            let mut entries = Vec::new();
            let mut failures = 0_usize;
            for (path, result) in inputs.iter().zip(results) {
                match result {
                    Ok((report, search)) => {
                        if json {
                            entries.push(probe_json(path, &report, search.as_ref()));
                        } else {
                            print_probe(path, &report, search.as_ref());
                        }
                    }
                    Err(error) => {
                        failures += 1;
                        if json {
                            entries.push(json!({
                                "path": path.display().to_string(),
                                "error": error.to_string(),
                            }));
                        } else {
                            eprintln!("{} {}: {error}", "error:".red().bold(), path.display());
                        }
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            if failures == inputs.len() {
                return Err("no input could be probed".into());
            }
        }
        Commands::Frame { input, index, out } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let mut capture = open_capture(&input, &cli.global)?;
            let frame = capture.read_at(index).ok_or(format!(
                "frame {index} is not readable ({} frames available)",
                capture.frame_count()
            ))?;
            frame.save(&out)?;
            if cli.global.verbose {
                println!("Saved frame {index} to {}", out.display());
            }
            capture.release();
        }
        Commands::Sample {
            input,
            out,
            count,
            ext,
        } => {
            if count == 0 {
                return Err("--count must be greater than 0".into());
            }
            let extension =
                parse_image_extension(&ext).ok_or(format!("unsupported image extension: {ext}"))?;

            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("writing into existing directory {}", out.display()).yellow()
                );
            }
            fs::create_dir_all(&out)?;

            let mut capture = open_capture(&input, &cli.global)?;
            let positions = sample_positions(capture.frame_count(), count);
            let mut saved = 0_usize;
            for position in &positions {
                let Some(frame) = capture.read_at(*position) else {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!("frame {position} could not be read").yellow()
                    );
                    continue;
                };
                let output_path = out.join(format!("frame_{position:06}.{extension}"));
                frame.save(&output_path)?;
                saved += 1;
                if cli.global.verbose {
                    println!("Saved {}", output_path.display());
                }
            }
            capture.release();

            println!(
                "{} {saved}/{} frames to {}",
                "Saved".green().bold(),
                positions.len(),
                out.display()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "delogo-capture", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_image_extension, parse_log_level, parse_probe_strategy, sample_positions};
    use delogo_capture::{FfmpegLogLevel, ProbeStrategy};

    #[test]
    fn sample_positions_are_centred_in_each_step() {
        assert_eq!(sample_positions(100, 10), vec![5, 15, 25, 35, 45, 55, 65, 75, 85, 95]);
    }

    #[test]
    fn sample_positions_with_more_samples_than_frames() {
        assert_eq!(sample_positions(3, 10), vec![0, 1, 2]);
        assert!(sample_positions(0, 10).is_empty());
    }

    #[test]
    fn parse_probe_strategy_aliases() {
        assert_eq!(parse_probe_strategy("tail"), Some(ProbeStrategy::TailOnly));
        assert_eq!(parse_probe_strategy("both"), Some(ProbeStrategy::HeadAndTail));
        assert!(parse_probe_strategy("middle").is_none());
    }

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("warn"), Some(FfmpegLogLevel::Warning));
        assert!(parse_log_level("loud").is_none());
    }

    #[test]
    fn parse_image_extension_aliases() {
        assert_eq!(parse_image_extension(".JPEG"), Some("jpg"));
        assert_eq!(parse_image_extension("tif"), Some("tiff"));
        assert!(parse_image_extension("gif").is_none());
    }
}
