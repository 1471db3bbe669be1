//! Configuration types for a slide-deck conversion run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to log the effective configuration and to diff two runs to understand
//! why their outputs differ.

use crate::error::SlidecastError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one deck-to-artifacts run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use slidecast::RunConfig;
///
/// let config = RunConfig::builder()
///     .synth_exe("piper-say")
///     .image_width(1280)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Speech-synthesis executable invoked once per slide as
    /// `<synth> -f text_NN.txt -o audio_NN.wav` with the output directory as
    /// working directory. Resolved via `PATH` when not absolute.
    /// Default: `csm-voice`.
    pub synth_exe: PathBuf,

    /// Render backend executable used to produce the PDF proxy of the deck.
    /// Default: `soffice`.
    pub soffice_exe: PathBuf,

    /// ffmpeg executable, used only when [`RunConfig::video`] is set.
    /// Default: `ffmpeg`.
    pub ffmpeg_exe: PathBuf,

    /// Output directory override. When `None`, artifacts go to a directory
    /// named after the input file (extension stripped), next to the input.
    pub output_dir: Option<PathBuf>,

    /// Target width in pixels for exported slide images. The height follows
    /// the slide's aspect ratio. Range: 320–4096. Default: 1920.
    ///
    /// 1920 matches a 16:9 deck rendered at full-HD. Decks are mostly large
    /// text, so there is little to gain above that, and narration video
    /// encodes (when enabled) get slower with every extra pixel.
    pub image_width: u32,

    /// Remove artifact files left over from a previous, differently-sized
    /// run of the same deck before processing starts. Default: true.
    ///
    /// Without this, shrinking a deck from 12 to 9 slides would leave
    /// `slide_10.png`..`slide_12.png` (and their text/audio partners) lying
    /// around, silently misrepresenting the deck's length.
    pub clean_stale: bool,

    /// Assemble the per-slide artifacts into a narration video after the
    /// slide loop. `None` (the default) skips video work entirely.
    pub video: Option<VideoSettings>,

    /// Observer for per-slide progress events. `None` disables reporting.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            synth_exe: PathBuf::from("csm-voice"),
            soffice_exe: PathBuf::from("soffice"),
            ffmpeg_exe: PathBuf::from("ffmpeg"),
            output_dir: None,
            image_width: 1920,
            clean_stale: true,
            video: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("synth_exe", &self.synth_exe)
            .field("soffice_exe", &self.soffice_exe)
            .field("ffmpeg_exe", &self.ffmpeg_exe)
            .field("output_dir", &self.output_dir)
            .field("image_width", &self.image_width)
            .field("clean_stale", &self.clean_stale)
            .field("video", &self.video)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn synth_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.config.synth_exe = exe.into();
        self
    }

    pub fn soffice_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.config.soffice_exe = exe.into();
        self
    }

    pub fn ffmpeg_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_exe = exe.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn image_width(mut self, px: u32) -> Self {
        self.config.image_width = px.clamp(320, 4096);
        self
    }

    pub fn clean_stale(mut self, v: bool) -> Self {
        self.config.clean_stale = v;
        self
    }

    pub fn video(mut self, settings: VideoSettings) -> Self {
        self.config.video = Some(settings);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, SlidecastError> {
        let c = &self.config;
        if c.image_width < 320 || c.image_width > 4096 {
            return Err(SlidecastError::InvalidConfig(format!(
                "image width must be 320–4096, got {}",
                c.image_width
            )));
        }
        if c.synth_exe.as_os_str().is_empty() {
            return Err(SlidecastError::InvalidConfig(
                "synthesizer executable must not be empty".into(),
            ));
        }
        if let Some(ref v) = c.video {
            if v.fps == 0 {
                return Err(SlidecastError::InvalidConfig(
                    "video fps must be ≥ 1".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

/// Encoding knobs for the optional narration video.
///
/// The defaults trade encode speed for size: a narration video of still
/// slides compresses well even at `ultrafast`, and the per-clip encode is
/// the slowest part of a `--video` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Frames per second. Static images still need a real frame rate for
    /// players to seek properly. Default: 24.
    pub fps: u32,
    /// x264 encoder preset. Default: "ultrafast".
    pub preset: String,
    /// Video bitrate passed to `-b:v`. Default: "1000k".
    pub bitrate: String,
    /// Silence inserted before each slide's narration, in milliseconds.
    /// Default: 1000.
    pub lead_in_ms: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            fps: 24,
            preset: "ultrafast".to_string(),
            bitrate: "1000k".to_string(),
            lead_in_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = RunConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.synth_exe, PathBuf::from("csm-voice"));
        assert_eq!(config.image_width, 1920);
        assert!(config.clean_stale);
        assert!(config.video.is_none());
    }

    #[test]
    fn image_width_is_clamped() {
        let config = RunConfig::builder().image_width(10).build().unwrap();
        assert_eq!(config.image_width, 320);
        let config = RunConfig::builder().image_width(100_000).build().unwrap();
        assert_eq!(config.image_width, 4096);
    }

    #[test]
    fn empty_synth_exe_rejected() {
        let result = RunConfig::builder().synth_exe("").build();
        assert!(matches!(result, Err(SlidecastError::InvalidConfig(_))));
    }

    #[test]
    fn zero_fps_rejected() {
        let result = RunConfig::builder()
            .video(VideoSettings {
                fps: 0,
                ..VideoSettings::default()
            })
            .build();
        assert!(matches!(result, Err(SlidecastError::InvalidConfig(_))));
    }

    #[test]
    fn debug_hides_callback() {
        use crate::progress::NoopProgressCallback;
        use std::sync::Arc;

        let config = RunConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("<dyn callback>"));
    }
}
