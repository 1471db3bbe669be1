//! Result-aggregation types for a conversion run.
//!
//! Each slide's outcome is an explicit record — index plus the status of its
//! image, text, and audio artifacts — rather than a trail of log lines.
//! The records roll up into [`RunStats`] and [`RunOutput`], all
//! serde-serializable so the CLI's `--json` mode is a plain
//! `serde_json::to_string` away.

use crate::error::{SlideError, SlidecastError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document properties read from the deck's OOXML package.
///
/// Everything here is optional in the wild: `docProps/core.xml` and
/// `docProps/app.xml` are not required parts of a valid package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckMetadata {
    /// Document title (`dc:title`).
    pub title: Option<String>,
    /// Document author (`dc:creator`).
    pub author: Option<String>,
    /// Producing application (`app.xml` `Application`).
    pub application: Option<String>,
    /// Creation timestamp, verbatim from the package.
    pub created: Option<String>,
    /// Last-modified timestamp, verbatim from the package.
    pub modified: Option<String>,
    /// Total slide count reported by `app.xml` (includes hidden slides);
    /// 0 when the part is absent.
    pub slide_count: usize,
    /// Hidden-slide count reported by `app.xml`; 0 when absent.
    pub hidden_slides: usize,
}

/// Status of one artifact file of one slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// File name within the output directory, e.g. `slide_03.png`.
    pub file: String,
    /// `None` when the artifact was written; the error otherwise.
    pub error: Option<SlideError>,
}

impl ArtifactRecord {
    pub(crate) fn written(file: String) -> Self {
        Self { file, error: None }
    }

    pub(crate) fn failed(file: String, error: SlideError) -> Self {
        Self {
            file,
            error: Some(error),
        }
    }

    /// True when the artifact file was produced.
    pub fn is_written(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one slide: the status of its artifact triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideOutcome {
    /// 1-based visible slide index.
    pub index: usize,
    pub image: ArtifactRecord,
    pub text: ArtifactRecord,
    pub audio: ArtifactRecord,
}

impl SlideOutcome {
    /// True when all three artifacts were produced.
    pub fn is_clean(&self) -> bool {
        self.image.is_written() && self.text.is_written() && self.audio.is_written()
    }

    /// Iterate over the errors recorded for this slide, if any.
    pub fn errors(&self) -> impl Iterator<Item = &SlideError> {
        self.image
            .error
            .iter()
            .chain(self.text.error.iter())
            .chain(self.audio.error.iter())
    }
}

/// Statistics describing a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Visible slides in the deck (the renderer's count).
    pub total_slides: usize,
    /// Slides whose full artifact triple was produced.
    pub clean_slides: usize,
    /// Slides with at least one failed artifact.
    pub failed_slides: usize,
    pub images_written: usize,
    pub notes_written: usize,
    pub audio_written: usize,
    /// Stale artifact files removed before processing started.
    pub stale_removed: usize,
    pub total_duration_ms: u64,
    /// Time spent in slide-image export across the run.
    pub render_duration_ms: u64,
    /// Time spent waiting on the synthesizer across the run.
    pub synthesis_duration_ms: u64,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// The per-deck output directory holding all artifacts.
    pub output_dir: PathBuf,
    /// Document properties (best-effort; defaults when unreadable).
    pub metadata: DeckMetadata,
    /// One outcome per visible slide, in slide order.
    pub slides: Vec<SlideOutcome>,
    /// Path of the assembled narration video, when video assembly ran.
    pub video: Option<PathBuf>,
    pub stats: RunStats,
}

impl RunOutput {
    /// Treat any per-slide failure as a hard error.
    ///
    /// `convert` itself returns `Ok` for partially-failed runs so callers
    /// can inspect the outcomes; this adapter is for callers that want
    /// all-or-nothing semantics.
    pub fn into_result(self) -> Result<RunOutput, SlidecastError> {
        if self.stats.failed_slides > 0 {
            Err(SlidecastError::PartialFailure {
                clean: self.stats.clean_slides,
                failed: self.stats.failed_slides,
                total: self.stats.total_slides,
            })
        } else {
            Ok(self)
        }
    }
}
