//! Speech synthesis: one blocking external-process call per slide.
//!
//! The synthesizer contract is deliberately small: an executable that
//! accepts `-f <input_text>` and `-o <output_audio>` and signals failure via
//! its exit code. The pipeline runs it with the output directory as working
//! directory and plain file names as arguments, so synthesizers that write
//! sidecar files do so next to the artifacts they belong to.
//!
//! A non-zero exit, a failed launch, or a clean exit that produced no audio
//! file are all reported as [`SlideError::SynthesisFailed`] for that slide;
//! the pipeline moves on to the next slide either way.

use crate::error::SlideError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Synthesize `text_file` into `audio_file`, both relative to `workdir`.
///
/// Blocks until the external process exits. No timeout is enforced — the
/// synthesizer owns its own time budget.
pub fn synthesize(
    synth_exe: &Path,
    workdir: &Path,
    text_file: &str,
    audio_file: &str,
    slide: usize,
) -> Result<(), SlideError> {
    debug!("synthesizing {text_file} -> {audio_file}");

    let output = Command::new(synth_exe)
        .arg("-f")
        .arg(text_file)
        .arg("-o")
        .arg(audio_file)
        .current_dir(workdir)
        // Python-based synthesizers need UTF-8 stdio for non-ASCII notes.
        .env("PYTHONIOENCODING", "utf-8")
        .output()
        .map_err(|e| SlideError::SynthesisFailed {
            slide,
            detail: format!("failed to launch '{}': {e}", synth_exe.display()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SlideError::SynthesisFailed {
            slide,
            detail: format!("{} ({})", output.status, excerpt(&stderr)),
        });
    }

    if !workdir.join(audio_file).exists() {
        return Err(SlideError::SynthesisFailed {
            slide,
            detail: format!("synthesizer exited 0 but produced no '{audio_file}'"),
        });
    }

    Ok(())
}

/// First line of stderr, bounded, for the per-slide error record. Cuts on
/// a character boundary.
fn excerpt(stderr: &str) -> String {
    const MAX: usize = 200;
    let line = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.len() <= MAX {
        return line.to_string();
    }
    let mut end = MAX;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}
