//! # slidecast
//!
//! Turn a slide deck into a directory of per-slide artifacts: an image
//! render, the speaker notes as text, and a synthesized audio narration —
//! optionally assembled into a narration video.
//!
//! ## Why this crate?
//!
//! Recording a voiced-over deck by hand means re-recording the whole thing
//! for every edit. slidecast regenerates everything from the deck itself:
//! the speaker notes *are* the narration script, so a one-line fix in the
//! notes is a one-command re-render.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck.pptx
//!  │
//!  ├─ 1. Input    validate the path and the OOXML container
//!  ├─ 2. Open     soffice → PDF proxy; pdfium page count; notes parse
//!  ├─ 3. Slides   for each visible slide, in order:
//!  │       image  slide_NN.png   (pdfium raster)
//!  │       text   text_NN.txt    (speaker notes, verbatim)
//!  │       audio  audio_NN.wav   (external synthesizer, blocking)
//!  ├─ 4. Video    optional: ffmpeg clips + concat → <deck>_video.mp4
//!  └─ 5. Summary  per-slide outcomes, run statistics, exit status
//! ```
//!
//! The run is strictly sequential — one deck, one slide at a time, blocking
//! waits on the external collaborators. A failed artifact is logged and
//! recorded; it never stops the remaining artifacts of its slide or the
//! slides after it. Only a missing/unreadable input or an unavailable
//! render backend aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidecast::{convert, RunConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .synth_exe("csm-voice")
//!         .build()?;
//!     let output = convert("talk.pptx", &config)?;
//!     println!(
//!         "{}/{} slides clean → {}",
//!         output.stats.clean_slides,
//!         output.stats.total_slides,
//!         output.output_dir.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## External collaborators
//!
//! | Tool | Role | Configured via |
//! |------|------|----------------|
//! | LibreOffice (`soffice`) | deck → PDF proxy for rasterisation | `--soffice` / `SLIDECAST_SOFFICE` |
//! | TTS executable (`-f in -o out`) | notes text → WAV narration | `--synth` / `SLIDECAST_SYNTH` |
//! | `ffmpeg` | optional narration video | `--ffmpeg` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slidecast` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! slidecast = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifacts::ArtifactKind;
pub use config::{RunConfig, RunConfigBuilder, VideoSettings};
pub use convert::{convert, convert_with_renderer, inspect};
pub use error::{SlideError, SlidecastError};
pub use output::{ArtifactRecord, DeckMetadata, RunOutput, RunStats, SlideOutcome};
pub use pipeline::render::{SlideRenderer, SofficeRenderer};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
