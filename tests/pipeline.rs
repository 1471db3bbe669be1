//! End-to-end pipeline tests.
//!
//! These drive the real orchestrator — input validation, output-directory
//! handling, the per-slide loop, stale sweeps, stats — against a fake
//! [`SlideRenderer`] and a fake synthesizer (a small shell script honouring
//! the `-f`/`-o` contract). No LibreOffice, pdfium, or TTS engine is
//! required, so the suite runs everywhere `/bin/sh` exists.
#![cfg(unix)]

use slidecast::{
    convert_with_renderer, PipelineProgressCallback, RunConfig, SlideError, SlideRenderer,
    SlidecastError,
};
use std::collections::BTreeSet;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A minimal real ZIP with a `.pptx` name, enough to pass input validation
/// and give the metadata reader something to chew on.
fn fake_deck(dir: &Path) -> PathBuf {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = zip::write::FileOptions::default();
        writer
            .start_file("[Content_Types].xml", options)
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("docProps/app.xml", options).unwrap();
        writer
            .write_all(
                br#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>FakePoint</Application><Slides>3</Slides></Properties>"#,
            )
            .unwrap();
        writer.finish().unwrap();
    }
    let path = dir.join("talk.pptx");
    std::fs::write(&path, buf.into_inner()).unwrap();
    path
}

/// Install an executable `/bin/sh` script acting as the synthesizer.
/// Scripts see `-f <text> -o <audio>` as `$1..$4`.
fn install_synth(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-synth");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A synthesizer that copies the notes text to the audio path.
fn copying_synth(dir: &Path) -> PathBuf {
    install_synth(dir, r#"cp "$2" "$4""#)
}

/// A renderer serving canned notes, with injectable per-slide failures.
#[derive(Default)]
struct FakeRenderer {
    notes: Vec<String>,
    fail_image_on: Option<usize>,
    fail_notes_on: Option<usize>,
    opened: bool,
    closed: bool,
}

impl FakeRenderer {
    fn with_notes(notes: &[&str]) -> Self {
        Self {
            notes: notes.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl SlideRenderer for FakeRenderer {
    fn open(&mut self, _deck: &Path) -> Result<(), SlidecastError> {
        self.opened = true;
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.notes.len()
    }

    fn export_image(&mut self, index: usize, out: &Path) -> Result<(), SlideError> {
        if self.fail_image_on == Some(index) {
            return Err(SlideError::RenderFailed {
                slide: index,
                detail: "injected render failure".into(),
            });
        }
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([12, 34, 56, 255]));
        image::DynamicImage::ImageRgba8(img)
            .save_with_format(out, image::ImageFormat::Png)
            .map_err(|e| SlideError::RenderFailed {
                slide: index,
                detail: e.to_string(),
            })
    }

    fn notes_text(&mut self, index: usize) -> Result<String, SlideError> {
        if self.fail_notes_on == Some(index) {
            return Err(SlideError::NotesFailed {
                slide: index,
                detail: "injected notes failure".into(),
            });
        }
        Ok(self.notes[index - 1].clone())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// All artifact-pattern file names currently in `dir`, sorted.
fn artifact_names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

fn config_for(out: &Path, synth: &Path) -> RunConfig {
    RunConfig::builder()
        .output_dir(out)
        .synth_exe(synth)
        .build()
        .expect("valid config")
}

// ── Happy path ───────────────────────────────────────────────────────────────

/// 3-slide deck, all steps succeed → exactly the nine artifact files, all
/// outcomes clean, deck released. The middle slide has no notes: its text
/// file exists, is empty, and does not fail the run.
#[test]
fn three_slide_happy_path_produces_full_triples() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let mut renderer = FakeRenderer::with_notes(&["Welcome everyone.", "", "Closing remarks."]);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert_eq!(output.stats.total_slides, 3);
    assert_eq!(output.stats.clean_slides, 3);
    assert_eq!(output.stats.failed_slides, 0);
    assert_eq!(output.stats.images_written, 3);
    assert_eq!(output.stats.notes_written, 3);
    assert_eq!(output.stats.audio_written, 3);

    let expected: BTreeSet<String> = [
        "slide_01.png",
        "slide_02.png",
        "slide_03.png",
        "text_01.txt",
        "text_02.txt",
        "text_03.txt",
        "audio_01.wav",
        "audio_02.wav",
        "audio_03.wav",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(artifact_names(&out), expected);

    // Notes are written verbatim; no notes means an empty file, not a
    // missing one.
    assert_eq!(
        std::fs::read_to_string(out.join("text_01.txt")).unwrap(),
        "Welcome everyone."
    );
    assert_eq!(std::fs::read_to_string(out.join("text_02.txt")).unwrap(), "");

    // The copying synthesizer mirrors the text into the audio file.
    assert_eq!(
        std::fs::read_to_string(out.join("audio_03.wav")).unwrap(),
        "Closing remarks."
    );

    assert!(renderer.opened);
    assert!(renderer.closed, "deck must be released at end of run");

    // Metadata came from the package, not the renderer.
    assert_eq!(output.metadata.application.as_deref(), Some("FakePoint"));
    assert_eq!(output.metadata.slide_count, 3);

    assert!(output.into_result().is_ok());
}

// ── Per-artifact error isolation ─────────────────────────────────────────────

/// Slide 2's synthesis fails → `audio_02.wav` absent,
/// slides 1 and 3 complete, exactly one synthesis error recorded, and the
/// aggregate result is a partial failure.
#[test]
fn synthesis_failure_is_isolated_to_its_slide() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    // Fails only when the notes contain the marker.
    let synth = install_synth(
        dir.path(),
        r#"grep -q boom "$2" && { echo "synth exploded" >&2; exit 3; }; cp "$2" "$4""#,
    );
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let mut renderer = FakeRenderer::with_notes(&["First.", "boom", "Third."]);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert_eq!(output.stats.failed_slides, 1);
    assert_eq!(output.stats.clean_slides, 2);
    assert_eq!(output.stats.audio_written, 2);

    assert!(!out.join("audio_02.wav").exists());
    for name in [
        "slide_01.png",
        "text_01.txt",
        "audio_01.wav",
        "slide_02.png",
        "text_02.txt",
        "slide_03.png",
        "text_03.txt",
        "audio_03.wav",
    ] {
        assert!(out.join(name).exists(), "{name} should exist");
    }

    let errors: Vec<&SlideError> = output.slides.iter().flat_map(|s| s.errors()).collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        SlideError::SynthesisFailed { slide, detail } => {
            assert_eq!(*slide, 2);
            assert!(detail.contains("synth exploded"), "got: {detail}");
        }
        other => panic!("expected SynthesisFailed, got {other:?}"),
    }

    assert!(matches!(
        output.into_result(),
        Err(SlidecastError::PartialFailure {
            clean: 2,
            failed: 1,
            total: 3
        })
    ));
}

/// A failed render never blocks notes extraction or synthesis for the same
/// slide.
#[test]
fn render_failure_does_not_block_other_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let mut renderer = FakeRenderer::with_notes(&["One.", "Two."]);
    renderer.fail_image_on = Some(1);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert!(!out.join("slide_01.png").exists());
    assert!(out.join("text_01.txt").exists());
    assert!(out.join("audio_01.wav").exists());
    assert!(out.join("slide_02.png").exists());

    assert_eq!(output.stats.failed_slides, 1);
    assert_eq!(output.stats.images_written, 1);
    assert_eq!(output.stats.notes_written, 2);
    assert_eq!(output.stats.audio_written, 2);
}

/// A notes failure leaves the text file absent; the synthesizer is still
/// invoked (and fails on the missing input), the image still renders.
#[test]
fn notes_failure_still_attempts_remaining_steps() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let mut renderer = FakeRenderer::with_notes(&["One.", "Two."]);
    renderer.fail_notes_on = Some(2);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert!(out.join("slide_02.png").exists());
    assert!(!out.join("text_02.txt").exists());
    assert!(!out.join("audio_02.wav").exists());

    let slide2 = &output.slides[1];
    assert!(!slide2.is_clean());
    assert_eq!(slide2.errors().count(), 2, "notes and synthesis both failed");
    assert_eq!(output.stats.failed_slides, 1);
}

/// An unreachable synthesizer executable fails every slide's audio but
/// nothing else.
#[test]
fn missing_synthesizer_fails_audio_only() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let out = dir.path().join("talk");
    let config = RunConfig::builder()
        .output_dir(&out)
        .synth_exe("/definitely/not/a/synth")
        .build()
        .unwrap();

    let mut renderer = FakeRenderer::with_notes(&["One.", "Two."]);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert_eq!(output.stats.images_written, 2);
    assert_eq!(output.stats.notes_written, 2);
    assert_eq!(output.stats.audio_written, 0);
    assert_eq!(output.stats.failed_slides, 2);
    assert!(output
        .slides
        .iter()
        .flat_map(|s| s.errors())
        .all(|e| matches!(e, SlideError::SynthesisFailed { .. })));
}

// ── Idempotence and the stale sweep ──────────────────────────────────────────

/// Running twice on the same deck yields the same index set; shrinking the
/// deck between runs removes the higher-index leftovers.
#[test]
fn rerun_on_shrunk_deck_removes_stale_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let mut big = FakeRenderer::with_notes(&["a", "b", "c", "d", "e"]);
    convert_with_renderer(&deck, &mut big, &config).expect("first run succeeds");
    assert_eq!(artifact_names(&out).len(), 15);

    let mut small = FakeRenderer::with_notes(&["a", "b", "c"]);
    let output = convert_with_renderer(&deck, &mut small, &config).expect("second run succeeds");

    assert_eq!(output.stats.stale_removed, 6);
    let names = artifact_names(&out);
    assert_eq!(names.len(), 9);
    assert!(!names.contains("slide_04.png"));
    assert!(!names.contains("audio_05.wav"));
}

/// `clean_stale(false)` leaves previous-run artifacts alone.
#[test]
fn keep_stale_preserves_previous_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = RunConfig::builder()
        .output_dir(&out)
        .synth_exe(&synth)
        .clean_stale(false)
        .build()
        .unwrap();

    let mut big = FakeRenderer::with_notes(&["a", "b", "c", "d"]);
    convert_with_renderer(&deck, &mut big, &config).expect("first run succeeds");

    let mut small = FakeRenderer::with_notes(&["a", "b"]);
    let output = convert_with_renderer(&deck, &mut small, &config).expect("second run succeeds");

    assert_eq!(output.stats.stale_removed, 0);
    assert!(out.join("slide_04.png").exists());
}

// ── Index width ──────────────────────────────────────────────────────────────

/// Decks of 100+ slides switch to three-digit indices with no gaps.
#[test]
fn large_decks_use_three_digit_indices() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = copying_synth(dir.path());
    let out = dir.path().join("talk");
    let config = config_for(&out, &synth);

    let notes: Vec<String> = (1..=100).map(|i| format!("slide {i}")).collect();
    let note_refs: Vec<&str> = notes.iter().map(String::as_str).collect();
    let mut renderer = FakeRenderer::with_notes(&note_refs);
    let output = convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert_eq!(output.stats.clean_slides, 100);
    let names = artifact_names(&out);
    assert_eq!(names.len(), 300);
    assert!(names.contains("slide_001.png"));
    assert!(names.contains("audio_100.wav"));
    assert!(!names.contains("slide_01.png"));
}

// ── Progress events ──────────────────────────────────────────────────────────

struct CountingCallback {
    run_total: AtomicUsize,
    starts: AtomicUsize,
    completes: AtomicUsize,
    artifact_errors: AtomicUsize,
    run_clean: AtomicUsize,
}

impl PipelineProgressCallback for CountingCallback {
    fn on_run_start(&self, total: usize) {
        self.run_total.store(total, Ordering::SeqCst);
    }
    fn on_slide_start(&self, _slide: usize, _total: usize) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
    fn on_artifact_error(&self, _slide: usize, _total: usize, _artifact: &str, _error: String) {
        self.artifact_errors.fetch_add(1, Ordering::SeqCst);
    }
    fn on_slide_complete(&self, _slide: usize, _total: usize, _clean: bool) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }
    fn on_run_complete(&self, _total: usize, clean: usize) {
        self.run_clean.store(clean, Ordering::SeqCst);
    }
}

#[test]
fn progress_callbacks_fire_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let deck = fake_deck(dir.path());
    let synth = install_synth(
        dir.path(),
        r#"grep -q boom "$2" && exit 3; cp "$2" "$4""#,
    );
    let out = dir.path().join("talk");

    let cb = Arc::new(CountingCallback {
        run_total: AtomicUsize::new(0),
        starts: AtomicUsize::new(0),
        completes: AtomicUsize::new(0),
        artifact_errors: AtomicUsize::new(0),
        run_clean: AtomicUsize::new(0),
    });

    let config = RunConfig::builder()
        .output_dir(&out)
        .synth_exe(&synth)
        .progress_callback(Arc::clone(&cb) as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    let mut renderer = FakeRenderer::with_notes(&["one", "boom", "three"]);
    convert_with_renderer(&deck, &mut renderer, &config).expect("run succeeds");

    assert_eq!(cb.run_total.load(Ordering::SeqCst), 3);
    assert_eq!(cb.starts.load(Ordering::SeqCst), 3);
    assert_eq!(cb.completes.load(Ordering::SeqCst), 3);
    assert_eq!(cb.artifact_errors.load(Ordering::SeqCst), 1);
    assert_eq!(cb.run_clean.load(Ordering::SeqCst), 2);
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

/// Input validation runs before the renderer is touched, and a fatal error
/// never creates the output directory.
#[test]
fn missing_input_never_reaches_the_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("talk");
    let synth = copying_synth(dir.path());
    let config = config_for(&out, &synth);

    let mut renderer = FakeRenderer::with_notes(&["unused"]);
    let result = convert_with_renderer(dir.path().join("absent.pptx"), &mut renderer, &config);

    assert!(matches!(result, Err(SlidecastError::InputNotFound { .. })));
    assert!(!renderer.opened);
    assert!(!out.exists(), "no output directory on fatal error");
}
