//! Error types for the slidecast library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SlidecastError`] — **Fatal**: the run cannot proceed at all (missing
//!   input, unsupported format, the render backend never came up). Returned
//!   as `Err(SlidecastError)` from the top-level `convert`/`inspect`
//!   functions before any slide is processed.
//!
//! * [`SlideError`] — **Non-fatal**: one artifact of one slide failed (a
//!   render glitch, a synthesizer that exited non-zero) but every other
//!   sub-step still runs. Stored inside [`crate::output::SlideOutcome`] so
//!   callers can inspect partial success rather than losing the whole deck
//!   to one bad slide.
//!
//! The separation lets callers decide their own tolerance: treat any slide
//! failure as an error via [`crate::output::RunOutput::into_result`], or
//! walk the outcomes for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the slidecast library.
///
/// Per-artifact failures use [`SlideError`] and are stored in
/// [`crate::output::SlideOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SlidecastError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("presentation not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not a supported presentation format.
    #[error("unsupported format '.{extension}' for '{path}': only .pptx decks are supported")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file exists and was read, but is not an OOXML package.
    #[error("file is not a .pptx package: '{path}'\nFirst bytes: {magic:?}")]
    NotAPresentation { path: PathBuf, magic: [u8; 4] },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The render backend could not be started or produced no output.
    #[error(
        "slide renderer unavailable: {detail}\n\
         slidecast drives a headless LibreOffice (soffice) to rasterise slides.\n\
         Install it, or point --soffice / SLIDECAST_SOFFICE at the executable."
    )]
    RendererUnavailable { detail: String },

    /// The deck opened but could not be read as a presentation.
    #[error("presentation '{path}' is corrupt: {detail}")]
    CorruptDeck { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the per-deck output directory.
    #[error("failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a run-level output file.
    #[error("failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Video errors ──────────────────────────────────────────────────────
    /// ffmpeg clip creation or concatenation failed.
    #[error("video assembly failed: {detail}")]
    VideoAssemblyFailed { detail: String },

    // ── Aggregate errors ──────────────────────────────────────────────────
    /// Some slides succeeded but at least one artifact failed.
    ///
    /// Returned by [`crate::output::RunOutput::into_result`] when the caller
    /// wants to treat any slide failure as an error.
    #[error("{failed}/{total} slides had at least one failed artifact")]
    PartialFailure {
        clean: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single artifact of a single slide.
///
/// Stored in [`crate::output::SlideOutcome`] when a sub-step fails. The run
/// continues with the remaining sub-steps and slides.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideError {
    /// Slide image export failed.
    #[error("slide {slide}: image render failed: {detail}")]
    RenderFailed { slide: usize, detail: String },

    /// Speaker-notes extraction or the text-file write failed.
    #[error("slide {slide}: notes extraction failed: {detail}")]
    NotesFailed { slide: usize, detail: String },

    /// The synthesizer exited non-zero, could not be launched, or produced
    /// no audio file.
    #[error("slide {slide}: synthesis failed: {detail}")]
    SynthesisFailed { slide: usize, detail: String },
}

impl SlideError {
    /// The 1-based index of the slide this error belongs to.
    pub fn slide(&self) -> usize {
        match self {
            SlideError::RenderFailed { slide, .. }
            | SlideError::NotesFailed { slide, .. }
            | SlideError::SynthesisFailed { slide, .. } => *slide,
        }
    }
}
