//! CLI binary for slidecast.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! wires the dual console + file log sinks, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use slidecast::{
    convert, inspect, PipelineProgressCallback, ProgressCallback, RunConfig, VideoSettings,
};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per slide.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set by `on_run_start`
    /// (called once the deck is open and the slide count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening deck…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_slides} slides…"))
        ));
    }

    fn on_slide_start(&self, slide: usize, _total: usize) {
        self.bar.set_message(format!("slide {slide}"));
    }

    fn on_artifact_error(&self, slide: usize, total: usize, artifact: &str, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            let mut end = 79;
            while !error.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}\u{2026}", &error[..end])
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {:<5}  {}",
            red("✗"),
            slide,
            total,
            artifact,
            red(&msg),
        ));
    }

    fn on_slide_complete(&self, slide: usize, total: usize, clean: bool) {
        if clean {
            self.bar.println(format!(
                "  {} Slide {:>3}/{:<3}  {}",
                green("✓"),
                slide,
                total,
                dim("image + text + audio"),
            ));
        }
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_slides: usize, clean_count: usize) {
        let failed = total_slides.saturating_sub(clean_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} slides converted successfully",
                green("✔"),
                bold(&clean_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} slides converted  ({} with failed artifacts)",
                if failed == total_slides {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&clean_count.to_string()),
                total_slides,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a deck (artifacts land in ./talk/)
  slidecast talk.pptx

  # Use a specific synthesizer and output directory
  slidecast --synth piper-say -o out/ talk.pptx

  # Assemble the narration video as well
  slidecast --video talk.pptx

  # Inspect deck properties (no soffice, no synthesizer)
  slidecast --inspect-only talk.pptx

  # Machine-readable run report
  slidecast --json talk.pptx > report.json

OUTPUT LAYOUT (for an N-slide deck):
  <deck-stem>/
    slide_01.png … slide_NN.png     rendered slides
    text_01.txt  … text_NN.txt      speaker notes, verbatim
    audio_01.wav … audio_NN.wav     synthesized narration
    clips/, <deck-stem>_video.mp4   only with --video
  error.log                         run log (cwd; see --log-file)

  Indices are 1-based and zero-padded to max(2, digits(N)).

THE SYNTHESIZER CONTRACT:
  Any executable accepting `-f <text-file> -o <audio-file>` works; it is
  invoked once per slide with the output directory as working directory and
  failure is signalled by a non-zero exit code.

ENVIRONMENT VARIABLES:
  SLIDECAST_SYNTH     Synthesizer executable (same as --synth)
  SLIDECAST_SOFFICE   LibreOffice executable (same as --soffice)

EXIT STATUS:
  0  every slide produced its full artifact triple
  1  fatal error, or at least one slide had a failed artifact
"#;

/// Turn a slide deck into per-slide images, notes text, and narration audio.
#[derive(Parser, Debug)]
#[command(
    name = "slidecast",
    version,
    about = "Turn a slide deck into per-slide images, notes text, and narration audio",
    long_about = "Convert a .pptx presentation into a directory of per-slide artifacts: a PNG \
render, the speaker notes as a text file, and a synthesized WAV narration per slide — \
optionally assembled into a narration video.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the presentation (.pptx).
    input: PathBuf,

    /// Output directory (default: a directory named after the deck, next to it).
    #[arg(short, long, env = "SLIDECAST_OUTPUT")]
    output_dir: Option<PathBuf>,

    /// Speech-synthesis executable, invoked as `<synth> -f text.txt -o audio.wav`.
    #[arg(long, env = "SLIDECAST_SYNTH", default_value = "csm-voice")]
    synth: PathBuf,

    /// LibreOffice executable used to rasterise slides.
    #[arg(long, env = "SLIDECAST_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// ffmpeg executable (used only with --video).
    #[arg(long, env = "SLIDECAST_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Slide image width in pixels (320–4096).
    #[arg(long, env = "SLIDECAST_WIDTH", default_value_t = 1920,
          value_parser = clap::value_parser!(u32).range(320..=4096))]
    width: u32,

    /// Assemble the artifacts into a narration video after the slide loop.
    #[arg(long, env = "SLIDECAST_VIDEO")]
    video: bool,

    /// Keep artifact files left over from a previous, differently-sized run.
    #[arg(long)]
    keep_stale: bool,

    /// Append the run log to this file.
    #[arg(long, env = "SLIDECAST_LOG_FILE", default_value = "error.log")]
    log_file: PathBuf,

    /// Output the run report as JSON instead of the human summary.
    #[arg(long, env = "SLIDECAST_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "SLIDECAST_NO_PROGRESS")]
    no_progress: bool,

    /// Print deck properties only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SLIDECAST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SLIDECAST_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Console and error.log receive the same events; the console filter is
    // raised while the progress bar is active so the bar stays readable,
    // but the file sink always gets the full run record.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let console_filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("failed to open log file {:?}", cli.log_file))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(console_filter)),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(log_file))
                .with_filter(EnvFilter::new(if cli.verbose { "debug" } else { "info" })),
        )
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).context("failed to inspect deck")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("failed to serialise metadata")?
            );
        } else {
            println!("File:          {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:         {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:        {}", a);
            }
            if let Some(ref app) = meta.application {
                println!("Application:   {}", app);
            }
            println!("Slides:        {}", meta.slide_count);
            println!("Hidden slides: {}", meta.hidden_slides);
            if let Some(ref c) = meta.created {
                println!("Created:       {}", c);
            }
            if let Some(ref m) = meta.modified {
                println!("Modified:      {}", m);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let mut builder = RunConfig::builder()
        .synth_exe(&cli.synth)
        .soffice_exe(&cli.soffice)
        .ffmpeg_exe(&cli.ffmpeg)
        .image_width(cli.width)
        .clean_stale(!cli.keep_stale);
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if cli.video {
        builder = builder.video(VideoSettings::default());
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match convert(&cli.input, &config) {
        Ok(output) => output,
        Err(e) => {
            // Through tracing rather than eprintln so the file sink retains
            // fatal errors too.
            tracing::error!("run failed: {e}");
            std::process::exit(1);
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {}/{} slides  {}ms  →  {}",
            if s.failed_slides == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            s.clean_slides,
            s.total_slides,
            s.total_duration_ms,
            bold(&output.output_dir.display().to_string()),
        );
        eprintln!(
            "   {} images  /  {} notes  /  {} audio",
            dim(&s.images_written.to_string()),
            dim(&s.notes_written.to_string()),
            dim(&s.audio_written.to_string()),
        );
        if let Some(ref video) = output.video {
            eprintln!("   {} {}", dim("video:"), bold(&video.display().to_string()));
        }
    }

    // Exit non-zero whenever any per-slide error was recorded.
    if output.stats.failed_slides > 0 {
        std::process::exit(1);
    }

    Ok(())
}
