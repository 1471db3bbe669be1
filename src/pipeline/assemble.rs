//! Optional narration-video assembly via ffmpeg.
//!
//! Two passes, both plain subprocess calls:
//!
//! 1. per slide, loop the still image over the narration audio into
//!    `clips/clip_NN.mp4` — the audio is delayed by the configured lead-in
//!    so each slide opens with a beat of silence, and `-shortest` ends the
//!    clip when the (delayed) narration ends;
//! 2. join the clips with ffmpeg's concat demuxer (`-c copy`, no re-encode)
//!    into `<stem>_video.mp4` in the output directory.
//!
//! Assembly only runs when every slide produced its full artifact triple;
//! feeding the concat list a missing clip would fail anyway, just later and
//! with a worse message.

use crate::artifacts::ArtifactKind;
use crate::config::VideoSettings;
use crate::error::SlidecastError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Build `clips/clip_NN.mp4` for every slide, then concatenate them into
/// `<stem>_video.mp4`. Returns the final video path.
pub fn assemble_video(
    ffmpeg_exe: &Path,
    output_dir: &Path,
    stem: &str,
    slide_count: usize,
    width: usize,
    settings: &VideoSettings,
) -> Result<PathBuf, SlidecastError> {
    let clips_dir = output_dir.join("clips");
    std::fs::create_dir_all(&clips_dir).map_err(|e| SlidecastError::OutputDirFailed {
        path: clips_dir.clone(),
        source: e,
    })?;

    info!("assembling narration video from {slide_count} clips");
    let mut clip_files = Vec::with_capacity(slide_count);
    for index in 1..=slide_count {
        let clip = clips_dir.join(format!("clip_{index:0width$}.mp4"));
        let args = clip_args(
            &ArtifactKind::Image.file_name(index, width),
            &ArtifactKind::Audio.file_name(index, width),
            &clip,
            settings,
        );
        run_ffmpeg(ffmpeg_exe, output_dir, &args, &format!("clip {index}"))?;
        debug!("created {}", clip.display());
        clip_files.push(clip);
    }

    let video_path = output_dir.join(format!("{stem}_video.mp4"));
    let list_path = clips_dir.join("concat_list.txt");
    std::fs::write(&list_path, concat_list(&clip_files)).map_err(|e| {
        SlidecastError::OutputWriteFailed {
            path: list_path.clone(),
            source: e,
        }
    })?;

    let args = concat_args(&list_path, &video_path);
    let result = run_ffmpeg(ffmpeg_exe, output_dir, &args, "concat");
    // The list file is scratch either way.
    let _ = std::fs::remove_file(&list_path);
    result?;

    info!("narration video: {}", video_path.display());
    Ok(video_path)
}

/// ffmpeg arguments for one slide clip. Image and audio names are relative
/// to the output directory (the subprocess working directory); the clip path
/// is absolute.
fn clip_args(image: &str, audio: &str, clip: &Path, settings: &VideoSettings) -> Vec<String> {
    let delay = settings.lead_in_ms;
    vec![
        "-y".into(),
        "-loop".into(),
        "1".into(),
        "-framerate".into(),
        settings.fps.to_string(),
        "-i".into(),
        image.into(),
        "-i".into(),
        audio.into(),
        "-af".into(),
        format!("adelay={delay}:all=1"),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        settings.preset.clone(),
        "-b:v".into(),
        settings.bitrate.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-shortest".into(),
        clip.to_string_lossy().into_owned(),
    ]
}

/// ffmpeg arguments for the concat pass.
fn concat_args(list: &Path, video: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.to_string_lossy().into_owned(),
        "-c".into(),
        "copy".into(),
        video.to_string_lossy().into_owned(),
    ]
}

/// concat-demuxer input list: one `file '<path>'` line per clip. Single
/// quotes in paths are escaped the way the demuxer expects.
fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|c| {
            let path = c.to_string_lossy().replace('\'', r"'\''");
            format!("file '{path}'\n")
        })
        .collect()
}

fn run_ffmpeg(
    ffmpeg_exe: &Path,
    workdir: &Path,
    args: &[String],
    what: &str,
) -> Result<(), SlidecastError> {
    let output = Command::new(ffmpeg_exe)
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|e| SlidecastError::VideoAssemblyFailed {
            detail: format!("failed to launch '{}': {e}", ffmpeg_exe.display()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
        return Err(SlidecastError::VideoAssemblyFailed {
            detail: format!(
                "{what}: ffmpeg exited with {}: {}",
                output.status,
                last_line.unwrap_or("")
            ),
        });
    }
    Ok(())
}
