//! Artifact naming and the stale-file sweep.
//!
//! Every file a run produces for a slide is named `<kind>_<index>.<ext>`
//! with a 1-based, zero-padded decimal index. The pad width is
//! `max(2, digits(N))` for an N-slide deck: two digits for ordinary decks
//! (`slide_01.png`), three from 100 slides up (`slide_001.png`), so indices
//! never truncate or collide.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// The three artifact kinds produced per slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Text,
    Audio,
}

impl ArtifactKind {
    /// File-name prefix for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Image => "slide",
            ArtifactKind::Text => "text",
            ArtifactKind::Audio => "audio",
        }
    }

    /// File extension for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Image => "png",
            ArtifactKind::Text => "txt",
            ArtifactKind::Audio => "wav",
        }
    }

    /// Label used in progress events and log lines.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Text => "text",
            ArtifactKind::Audio => "audio",
        }
    }

    /// Build the artifact file name for a slide index at the given pad width.
    pub fn file_name(self, index: usize, width: usize) -> String {
        format!(
            "{}_{:0width$}.{}",
            self.prefix(),
            index,
            self.extension(),
            width = width
        )
    }
}

/// Zero-pad width for an N-slide deck: `max(2, digits(N))`.
pub fn index_width(slide_count: usize) -> usize {
    let mut digits = 1;
    let mut n = slide_count;
    while n >= 10 {
        digits += 1;
        n /= 10;
    }
    digits.max(2)
}

/// Matches any file this pipeline could ever have produced for a slide,
/// regardless of pad width or deck size.
static ARTIFACT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:slide|text|audio)_\d+\.(?:png|txt|wav)$").unwrap());

/// Remove artifact files in `dir` that do not belong to the current run.
///
/// The expected set is the 3×N names of this run; anything else matching the
/// artifact pattern is a leftover from a previous, differently-sized run
/// (higher indices, or a different pad width) and is deleted. Files that do
/// not match the pattern are never touched. Returns the number of files
/// removed; individual removal failures are logged and skipped.
pub fn clean_stale(dir: &Path, slide_count: usize) -> io::Result<usize> {
    let width = index_width(slide_count);
    let expected: HashSet<String> = (1..=slide_count)
        .flat_map(|i| {
            [
                ArtifactKind::Image.file_name(i, width),
                ArtifactKind::Text.file_name(i, width),
                ArtifactKind::Audio.file_name(i, width),
            ]
        })
        .collect();

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if ARTIFACT_NAME.is_match(name) && !expected.contains(name) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("removed stale artifact {name}");
                    removed += 1;
                }
                Err(e) => warn!("could not remove stale artifact {name}: {e}"),
            }
        }
    }
    Ok(removed)
}
