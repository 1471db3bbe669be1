//! The pipeline orchestrator: one deck in, one artifact directory out.
//!
//! ## Error policy
//!
//! Everything up to and including opening the deck is fatal — a missing
//! input or an unavailable render backend aborts before any slide work and
//! before any output directory exists where possible. From the first slide
//! on, failures shrink to the smallest possible scope: each of the three
//! artifact sub-steps (image, text, audio) is attempted independently, so a
//! bad render never blocks notes extraction for the same slide and a bad
//! slide never blocks the next one. The per-slide record keeps what failed
//! and why; `convert` still returns `Ok` so callers can inspect partial
//! success (see [`RunOutput::into_result`] for all-or-nothing semantics).

use crate::artifacts::{self, ArtifactKind};
use crate::config::RunConfig;
use crate::error::{SlideError, SlidecastError};
use crate::output::{ArtifactRecord, DeckMetadata, RunOutput, RunStats, SlideOutcome};
use crate::pipeline::render::{SlideRenderer, SofficeRenderer};
use crate::pipeline::{assemble, input, notes, synth};
use crate::progress::ProgressCallback;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Convert a slide deck into per-slide artifacts.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — path to a `.pptx` presentation
/// * `config` — run configuration
///
/// # Returns
/// `Ok(RunOutput)` on a completed run, even if some slides failed
/// (check `output.stats.failed_slides`).
///
/// # Errors
/// Returns `Err(SlidecastError)` only for fatal errors:
/// - input missing, unreadable, or not a `.pptx` package
/// - render backend unavailable or the deck unopenable
/// - output directory creation failure
/// - video assembly failure (when enabled and the run was clean)
pub fn convert(input: impl AsRef<Path>, config: &RunConfig) -> Result<RunOutput, SlidecastError> {
    let mut renderer = SofficeRenderer::new(config);
    convert_with_renderer(input, &mut renderer, config)
}

/// [`convert`] with an injected render backend.
///
/// The orchestrator only sees the [`SlideRenderer`] surface, so tests can
/// drive the full pipeline against a fake renderer.
pub fn convert_with_renderer(
    input: impl AsRef<Path>,
    renderer: &mut dyn SlideRenderer,
    config: &RunConfig,
) -> Result<RunOutput, SlidecastError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("starting run: {}", input.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let deck = input::resolve_deck(input)?;

    // ── Step 2: Document properties (best-effort) ────────────────────────
    let metadata = notes::read_metadata(&deck).unwrap_or_else(|e| {
        warn!("could not read document properties: {e}");
        DeckMetadata::default()
    });

    // ── Step 3: Output directory ─────────────────────────────────────────
    let output_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| input::default_output_dir(&deck));
    std::fs::create_dir_all(&output_dir).map_err(|e| SlidecastError::OutputDirFailed {
        path: output_dir.clone(),
        source: e,
    })?;
    info!("output directory: {}", output_dir.display());

    // ── Step 4: Open the deck ────────────────────────────────────────────
    renderer.open(&deck)?;
    let total = renderer.slide_count();
    let width = artifacts::index_width(total);
    info!("deck has {total} visible slides");

    // ── Step 5: Stale-artifact sweep ─────────────────────────────────────
    let stale_removed = if config.clean_stale {
        match artifacts::clean_stale(&output_dir, total) {
            Ok(0) => 0,
            Ok(n) => {
                info!("removed {n} stale artifact files from a previous run");
                n
            }
            Err(e) => {
                warn!("stale-artifact sweep failed: {e}");
                0
            }
        }
    } else {
        0
    };

    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    // ── Step 6: Per-slide loop, strictly ascending ───────────────────────
    let mut slides = Vec::with_capacity(total);
    let mut render_duration_ms = 0u64;
    let mut synthesis_duration_ms = 0u64;

    for index in 1..=total {
        if let Some(cb) = cb {
            cb.on_slide_start(index, total);
        }
        info!("processing slide {index}/{total}");

        let image_name = ArtifactKind::Image.file_name(index, width);
        let text_name = ArtifactKind::Text.file_name(index, width);
        let audio_name = ArtifactKind::Audio.file_name(index, width);

        // Sub-step 1: image render.
        let step_start = Instant::now();
        let image = record(
            renderer.export_image(index, &output_dir.join(&image_name)),
            image_name,
            ArtifactKind::Image,
            index,
            total,
            cb,
        );
        render_duration_ms += step_start.elapsed().as_millis() as u64;

        // Sub-step 2: speaker notes, written verbatim (empty notes are a
        // normal case and still produce the file).
        let text_result = renderer.notes_text(index).and_then(|notes_text| {
            std::fs::write(output_dir.join(&text_name), &notes_text).map_err(|e| {
                SlideError::NotesFailed {
                    slide: index,
                    detail: format!("failed to write {text_name}: {e}"),
                }
            })
        });
        let text = record(text_result, text_name.clone(), ArtifactKind::Text, index, total, cb);

        // Sub-step 3: synthesis, attempted regardless of the first two.
        let step_start = Instant::now();
        let audio = record(
            synth::synthesize(&config.synth_exe, &output_dir, &text_name, &audio_name, index),
            audio_name,
            ArtifactKind::Audio,
            index,
            total,
            cb,
        );
        synthesis_duration_ms += step_start.elapsed().as_millis() as u64;

        let outcome = SlideOutcome {
            index,
            image,
            text,
            audio,
        };
        if let Some(cb) = cb {
            cb.on_slide_complete(index, total, outcome.is_clean());
        }
        slides.push(outcome);
    }

    // ── Step 7: Release the deck, no matter what the loop recorded ───────
    renderer.close();

    // ── Step 8: Stats and summary ────────────────────────────────────────
    let clean = slides.iter().filter(|s| s.is_clean()).count();
    let failed = slides.len() - clean;
    let stats = RunStats {
        total_slides: total,
        clean_slides: clean,
        failed_slides: failed,
        images_written: slides.iter().filter(|s| s.image.is_written()).count(),
        notes_written: slides.iter().filter(|s| s.text.is_written()).count(),
        audio_written: slides.iter().filter(|s| s.audio.is_written()).count(),
        stale_removed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        synthesis_duration_ms,
    };

    if let Some(cb) = cb {
        cb.on_run_complete(total, clean);
    }
    info!(
        "run complete: {clean}/{total} slides clean, {failed} with failures, {}ms total",
        stats.total_duration_ms
    );

    // ── Step 9: Optional narration video ─────────────────────────────────
    let video = match config.video {
        Some(ref settings) if total > 0 && failed == 0 => Some(assemble::assemble_video(
            &config.ffmpeg_exe,
            &output_dir,
            &deck_stem(&deck),
            total,
            width,
            settings,
        )?),
        Some(_) if total == 0 => {
            warn!("skipping video assembly: deck has no slides");
            None
        }
        Some(_) => {
            warn!("skipping video assembly: {failed} of {total} slides incomplete");
            None
        }
        None => None,
    };

    Ok(RunOutput {
        output_dir,
        metadata,
        slides,
        video,
        stats,
    })
}

/// Read a deck's document properties without converting anything.
///
/// Does not touch the render backend or the synthesizer.
pub fn inspect(input: impl AsRef<Path>) -> Result<DeckMetadata, SlidecastError> {
    let deck = input::resolve_deck(input.as_ref())?;
    notes::read_metadata(&deck)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Fold one sub-step result into an [`ArtifactRecord`], logging and
/// reporting the error path.
fn record(
    result: Result<(), SlideError>,
    file: String,
    kind: ArtifactKind,
    index: usize,
    total: usize,
    cb: Option<&ProgressCallback>,
) -> ArtifactRecord {
    match result {
        Ok(()) => ArtifactRecord::written(file),
        Err(e) => {
            error!("{e}");
            if let Some(cb) = cb {
                cb.on_artifact_error(index, total, kind.label(), e.to_string());
            }
            ArtifactRecord::failed(file, e)
        }
    }
}

fn deck_stem(deck: &Path) -> String {
    deck.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pptx");
        let config = RunConfig::builder()
            .output_dir(dir.path().join("out"))
            .build()
            .unwrap();

        let result = convert(&missing, &config);
        assert!(matches!(result, Err(SlidecastError::InputNotFound { .. })));
        assert!(!dir.path().join("out").exists(), "no output dir on fatal error");
    }

    #[test]
    fn unsupported_extension_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("deck.key");
        std::fs::write(&deck, b"PK\x03\x04").unwrap();
        let config = RunConfig::builder()
            .output_dir(dir.path().join("out"))
            .build()
            .unwrap();

        let result = convert(&deck, &config);
        assert!(matches!(
            result,
            Err(SlidecastError::UnsupportedFormat { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn inspect_rejects_non_decks() {
        let result = inspect("/definitely/not/here.pptx");
        assert!(matches!(result, Err(SlidecastError::InputNotFound { .. })));
    }
}
