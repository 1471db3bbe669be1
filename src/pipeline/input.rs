//! Input validation: reject anything that is not a readable `.pptx` deck.
//!
//! Validation happens before the output directory is created, so a typo'd
//! path never leaves an empty directory behind. The ZIP local-header magic
//! (`PK\x03\x04`) is checked up front: both the notes extractor and the
//! render backend would otherwise fail later with far less useful errors.

use crate::error::SlidecastError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// ZIP local file header magic — every OOXML package starts with it.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Validate `path` as a readable `.pptx` presentation.
///
/// Returns the path unchanged on success so callers can keep working with
/// whatever form (relative/absolute) the user supplied.
pub fn resolve_deck(path: &Path) -> Result<PathBuf, SlidecastError> {
    if !path.exists() {
        return Err(SlidecastError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if extension != "pptx" {
        return Err(SlidecastError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    }

    // Check read permission by attempting to open, and verify the container
    // magic while the handle is there.
    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && magic != ZIP_MAGIC {
                return Err(SlidecastError::NotAPresentation {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SlidecastError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(SlidecastError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("resolved deck: {}", path.display());
    Ok(path.to_path_buf())
}

/// Default output directory for a deck: sibling directory named after the
/// file with its extension stripped.
pub fn default_output_dir(deck: &Path) -> PathBuf {
    let stem = deck
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string());
    match deck.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(stem),
        _ => PathBuf::from(stem),
    }
}
