//! Slide rendering: the capability trait and its production implementation.
//!
//! ## Why a trait?
//!
//! The render backend is a desktop application driven from outside — exactly
//! the kind of dependency that makes a pipeline untestable if its calls are
//! scattered around. The orchestrator only ever sees the narrow
//! [`SlideRenderer`] surface (`open`, `slide_count`, `export_image`,
//! `notes_text`, `close`), so tests drive the whole pipeline against a fake.
//!
//! ## The production path
//!
//! [`SofficeRenderer`] converts the deck to a PDF proxy with a headless
//! LibreOffice subprocess (`soffice --headless --convert-to pdf`), then
//! rasterises individual pages with pdfium and writes PNGs. The PDF export
//! omits hidden slides, matching the notes extractor's hidden-slide
//! skipping; if the two ever disagree, the page count wins and out-of-range
//! notes lookups come back empty.

use crate::config::RunConfig;
use crate::error::{SlideError, SlidecastError};
use crate::pipeline::notes::{self, DeckNotes};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Narrow interface over the slide render backend.
///
/// One renderer drives one deck at a time: `open` before anything else,
/// `close` when done. Slide indices are 1-based visible-slide ordinals.
pub trait SlideRenderer: Send {
    /// Open the deck and prepare it for per-slide requests.
    fn open(&mut self, deck: &Path) -> Result<(), SlidecastError>;

    /// Number of visible slides in the opened deck; 0 before `open`.
    fn slide_count(&self) -> usize;

    /// Export slide `index` as a PNG at `out`.
    fn export_image(&mut self, index: usize, out: &Path) -> Result<(), SlideError>;

    /// Speaker-notes text for slide `index`; empty string when the slide has
    /// no notes.
    fn notes_text(&mut self, index: usize) -> Result<String, SlideError>;

    /// Release the deck. Idempotent; called unconditionally at end of run.
    fn close(&mut self);
}

/// Production renderer: headless LibreOffice → PDF proxy → pdfium raster.
pub struct SofficeRenderer {
    soffice_exe: PathBuf,
    image_width: u32,
    deck: Option<OpenDeck>,
}

struct OpenDeck {
    pdf_path: PathBuf,
    page_count: usize,
    notes: Option<DeckNotes>,
    // Keeps the proxy PDF alive until `close`.
    _proxy_dir: TempDir,
}

impl SofficeRenderer {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            soffice_exe: config.soffice_exe.clone(),
            image_width: config.image_width,
            deck: None,
        }
    }

    /// Run soffice to convert the deck into a PDF inside `out_dir`.
    fn convert_to_pdf(&self, deck: &Path, out_dir: &Path) -> Result<PathBuf, SlidecastError> {
        info!(
            "converting deck to PDF proxy via {}",
            self.soffice_exe.display()
        );
        let output = Command::new(&self.soffice_exe)
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(deck)
            .output()
            .map_err(|e| SlidecastError::RendererUnavailable {
                detail: format!("failed to launch '{}': {e}", self.soffice_exe.display()),
            })?;

        if !output.status.success() {
            return Err(SlidecastError::RendererUnavailable {
                detail: format!(
                    "soffice exited with {}: {}",
                    output.status,
                    tail(&String::from_utf8_lossy(&output.stderr))
                ),
            });
        }

        let stem = deck
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string());
        let pdf_path = out_dir.join(format!("{stem}.pdf"));
        if !pdf_path.exists() {
            return Err(SlidecastError::RendererUnavailable {
                detail: format!("soffice exited 0 but produced no '{}'", pdf_path.display()),
            });
        }
        Ok(pdf_path)
    }
}

/// Bind to the system pdfium library.
///
/// The binding is cheap to re-create (the OS caches the loaded library), so
/// it is not held across calls; pdfium documents borrow the binding and
/// holding both in one struct would tie the renderer to the document's
/// lifetime.
fn bind_pdfium() -> Result<Pdfium, String> {
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| format!("failed to bind pdfium: {e:?}"))
}

impl SlideRenderer for SofficeRenderer {
    fn open(&mut self, deck: &Path) -> Result<(), SlidecastError> {
        let proxy_dir = TempDir::new().map_err(|e| SlidecastError::Internal(e.to_string()))?;
        let pdf_path = self.convert_to_pdf(deck, proxy_dir.path())?;

        let pdfium =
            bind_pdfium().map_err(|detail| SlidecastError::RendererUnavailable { detail })?;
        let page_count = {
            let document = pdfium.load_pdf_from_file(&pdf_path, None).map_err(|e| {
                SlidecastError::CorruptDeck {
                    path: deck.to_path_buf(),
                    detail: format!("proxy PDF unreadable: {e:?}"),
                }
            })?;
            document.pages().len() as usize
        };
        info!("deck opened: {page_count} visible slides");

        let deck_notes = match notes::extract_notes(deck) {
            Ok(n) => {
                if n.visible_count() != page_count {
                    warn!(
                        "notes extractor found {} visible slides, renderer found {page_count}; \
                         out-of-range notes will be empty",
                        n.visible_count()
                    );
                }
                Some(n)
            }
            Err(e) => {
                // Non-fatal: images can still render. Each notes_text call
                // reports the failure for its slide.
                warn!("speaker-notes extraction failed: {e}");
                None
            }
        };

        self.deck = Some(OpenDeck {
            pdf_path,
            page_count,
            notes: deck_notes,
            _proxy_dir: proxy_dir,
        });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.deck.as_ref().map_or(0, |d| d.page_count)
    }

    fn export_image(&mut self, index: usize, out: &Path) -> Result<(), SlideError> {
        let render_failed = |detail: String| SlideError::RenderFailed {
            slide: index,
            detail,
        };
        let deck = self
            .deck
            .as_ref()
            .ok_or_else(|| render_failed("renderer used before open".to_string()))?;

        if index == 0 || index > deck.page_count {
            return Err(render_failed(format!(
                "slide out of range (deck has {})",
                deck.page_count
            )));
        }

        let pdfium = bind_pdfium().map_err(render_failed)?;
        let document = pdfium
            .load_pdf_from_file(&deck.pdf_path, None)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let page = document
            .pages()
            .get((index - 1) as u16)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let render_config = PdfRenderConfig::new().set_target_width(self.image_width as i32);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let image = bitmap.as_image();
        debug!(
            "rendered slide {index} → {}x{} px",
            image.width(),
            image.height()
        );

        image
            .save_with_format(out, image::ImageFormat::Png)
            .map_err(|e| render_failed(format!("PNG write failed: {e}")))
    }

    fn notes_text(&mut self, index: usize) -> Result<String, SlideError> {
        let deck = self.deck.as_ref().ok_or_else(|| SlideError::NotesFailed {
            slide: index,
            detail: "renderer used before open".to_string(),
        })?;
        match deck.notes {
            Some(ref notes) => Ok(notes.for_slide(index).unwrap_or_default().to_string()),
            None => Err(SlideError::NotesFailed {
                slide: index,
                detail: "speaker-notes extraction failed at open".to_string(),
            }),
        }
    }

    fn close(&mut self) {
        if self.deck.take().is_some() {
            debug!("deck released");
        }
    }
}

impl Drop for SofficeRenderer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Last part of a subprocess's stderr, enough to diagnose without flooding
/// the log. Cuts on a character boundary.
fn tail(stderr: &str) -> String {
    const MAX: usize = 400;
    let trimmed = stderr.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - MAX;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("…{}", &trimmed[start..])
}
