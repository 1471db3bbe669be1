//! Progress-callback trait for per-slide pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the pipeline works through the deck. The callback approach is the
//! least-invasive integration point: callers can forward events to a
//! terminal progress bar, a GUI, or a log without the library knowing how
//! the host application communicates.
//!
//! The pipeline is strictly sequential, so events arrive in slide order from
//! a single thread; the `Send + Sync` bound exists only so the callback can
//! be shared via `Arc` between the caller and the config.

use std::sync::Arc;

/// Called by the pipeline as it processes each slide.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after the deck is opened, before any slide is processed.
    ///
    /// # Arguments
    /// * `total_slides` — number of visible slides that will be processed
    fn on_run_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called just before a slide's three artifact sub-steps run.
    fn on_slide_start(&self, slide: usize, total_slides: usize) {
        let _ = (slide, total_slides);
    }

    /// Called when one artifact sub-step of a slide fails.
    ///
    /// # Arguments
    /// * `slide` — 1-indexed slide number
    /// * `artifact` — `"image"`, `"text"`, or `"audio"`
    /// * `error` — human-readable error description
    fn on_artifact_error(&self, slide: usize, total_slides: usize, artifact: &str, error: String) {
        let _ = (slide, total_slides, artifact, error);
    }

    /// Called after all three sub-steps of a slide have been attempted.
    ///
    /// # Arguments
    /// * `clean` — true when image, text, and audio were all produced
    fn on_slide_complete(&self, slide: usize, total_slides: usize, clean: bool) {
        let _ = (slide, total_slides, clean);
    }

    /// Called once after all slides have been attempted.
    fn on_run_complete(&self, total_slides: usize, clean_count: usize) {
        let _ = (total_slides, clean_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
