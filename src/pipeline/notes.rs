//! Speaker-notes and document-properties extraction from the OOXML package.
//!
//! A `.pptx` file is a ZIP archive of XML parts. This module reads, in
//! order:
//!
//! * `ppt/_rels/presentation.xml.rels` — relationship id → part path
//! * `ppt/presentation.xml` — `<p:sldIdLst>` gives the authoritative slide
//!   order (relationship ids are *not* ordered)
//! * `ppt/slides/slideN.xml` — the root element's `show="0"` attribute marks
//!   a hidden slide; hidden slides are skipped and visible slides renumbered
//!   contiguously
//! * `ppt/slides/_rels/slideN.xml.rels` — locates the slide's notes part
//! * `ppt/notesSlides/notesSlideN.xml` — the `body` placeholder's text is
//!   the speaker notes, paragraphs joined with `\n`
//!
//! A slide without a notes part yields the empty string — a normal case,
//! not an error. `docProps/core.xml` and `docProps/app.xml` feed
//! [`DeckMetadata`] on a best-effort basis.

use crate::error::SlidecastError;
use crate::output::DeckMetadata;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Speaker notes for every visible slide of a deck, in slide order.
#[derive(Debug, Clone)]
pub struct DeckNotes {
    notes: Vec<String>,
}

impl DeckNotes {
    /// Number of visible slides the notes were extracted for.
    pub fn visible_count(&self) -> usize {
        self.notes.len()
    }

    /// Notes text for a 1-based visible slide index; `None` out of range.
    pub fn for_slide(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.notes.get(i))
            .map(String::as_str)
    }
}

/// Extract speaker notes for all visible slides of `deck`.
pub fn extract_notes(deck: &Path) -> Result<DeckNotes, SlidecastError> {
    let mut archive = open_archive(deck)?;

    let rels = read_part(&mut archive, deck, "ppt/_rels/presentation.xml.rels")?;
    let rel_targets = parse_relationships(&rels, deck)?;
    let presentation = read_part(&mut archive, deck, "ppt/presentation.xml")?;
    let slide_paths = ordered_slide_paths(&presentation, &rel_targets, deck)?;

    let mut notes = Vec::with_capacity(slide_paths.len());
    for (ordinal, slide_path) in slide_paths.iter().enumerate() {
        let slide_xml = read_part(&mut archive, deck, slide_path)?;
        if slide_is_hidden(&slide_xml) {
            debug!("skipping hidden slide {} ({slide_path})", ordinal + 1);
            continue;
        }

        let text = match notes_part_for(&mut archive, slide_path) {
            Some(notes_path) => {
                let notes_xml = read_part(&mut archive, deck, &notes_path)?;
                notes_body_text(&notes_xml, deck)?
            }
            None => String::new(),
        };
        notes.push(text);
    }

    debug!("extracted notes for {} visible slides", notes.len());
    Ok(DeckNotes { notes })
}

/// Read document properties from `docProps/core.xml` and `docProps/app.xml`.
///
/// Both parts are optional in a valid package; missing parts leave the
/// corresponding fields at their defaults.
pub fn read_metadata(deck: &Path) -> Result<DeckMetadata, SlidecastError> {
    let mut archive = open_archive(deck)?;
    let mut meta = DeckMetadata::default();

    if let Ok(core) = read_part(&mut archive, deck, "docProps/core.xml") {
        parse_core_properties(&core, &mut meta);
    }
    if let Ok(app) = read_part(&mut archive, deck, "docProps/app.xml") {
        parse_app_properties(&app, &mut meta);
    }

    Ok(meta)
}

// ── ZIP plumbing ─────────────────────────────────────────────────────────

fn open_archive(deck: &Path) -> Result<ZipArchive<std::fs::File>, SlidecastError> {
    let file = std::fs::File::open(deck).map_err(|e| SlidecastError::CorruptDeck {
        path: deck.to_path_buf(),
        detail: format!("cannot open: {e}"),
    })?;
    ZipArchive::new(file).map_err(|e| SlidecastError::CorruptDeck {
        path: deck.to_path_buf(),
        detail: format!("not a readable ZIP archive: {e}"),
    })
}

fn read_part(
    archive: &mut ZipArchive<std::fs::File>,
    deck: &Path,
    part: &str,
) -> Result<String, SlidecastError> {
    let mut file = archive
        .by_name(part)
        .map_err(|e| SlidecastError::CorruptDeck {
            path: deck.to_path_buf(),
            detail: format!("missing part '{part}': {e}"),
        })?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| SlidecastError::CorruptDeck {
            path: deck.to_path_buf(),
            detail: format!("failed to read part '{part}': {e}"),
        })?;
    Ok(content)
}

// ── Relationship and slide-order parsing ─────────────────────────────────

/// Parse a `.rels` part into id → (type, target).
fn parse_relationships(
    xml: &str,
    deck: &Path,
) -> Result<HashMap<String, (String, String)>, SlidecastError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }
                if !id.is_empty() {
                    rels.insert(id, (rel_type, target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SlidecastError::CorruptDeck {
                    path: deck.to_path_buf(),
                    detail: format!("malformed relationships: {e}"),
                });
            }
            _ => {}
        }
    }
    Ok(rels)
}

/// Slide part paths in presentation order, from `<p:sldIdLst>`.
fn ordered_slide_paths(
    presentation_xml: &str,
    rels: &HashMap<String, (String, String)>,
    deck: &Path,
) -> Result<Vec<String>, SlidecastError> {
    let mut reader = Reader::from_str(presentation_xml);
    reader.trim_text(true);
    let mut paths = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `p:sldId` carries both a numeric `id` and the relationship
                // `r:id`; only the exact `r:id` key identifies the part.
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"r:id" {
                        let rid = String::from_utf8_lossy(&attr.value).to_string();
                        match rels.get(&rid) {
                            Some((rel_type, target)) if is_slide_rel(rel_type) => {
                                paths.push(resolve_target("ppt", target));
                            }
                            Some(_) | None => {
                                warn!("slide id {rid} has no slide relationship; skipping");
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SlidecastError::CorruptDeck {
                    path: deck.to_path_buf(),
                    detail: format!("malformed presentation part: {e}"),
                });
            }
            _ => {}
        }
    }
    Ok(paths)
}

fn is_slide_rel(rel_type: &str) -> bool {
    rel_type.ends_with("/slide")
}

/// Whether a slide part is flagged hidden (`<p:sld show="0">`).
fn slide_is_hidden(slide_xml: &str) -> bool {
    let mut reader = Reader::from_str(slide_xml);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == b"sld" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"show" {
                        return attr.value.as_ref() == b"0";
                    }
                }
                return false;
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
    }
}

/// Locate the notes part for a slide via the slide's own `.rels` part.
///
/// Returns `None` when the slide has no relationships part or no notes
/// relationship — both mean "no speaker notes".
fn notes_part_for(archive: &mut ZipArchive<std::fs::File>, slide_path: &str) -> Option<String> {
    let (dir, file) = slide_path.rsplit_once('/')?;
    let rels_path = format!("{dir}/_rels/{file}.rels");

    let mut content = String::new();
    archive
        .by_name(&rels_path)
        .ok()?
        .read_to_string(&mut content)
        .ok()?;

    let rels = parse_relationships(&content, Path::new(slide_path)).ok()?;
    rels.values()
        .find(|(rel_type, _)| rel_type.ends_with("/notesSlide"))
        .map(|(_, target)| resolve_target(dir, target))
}

/// Resolve a relationship target against the directory of its source part,
/// handling absolute (`/ppt/...`) and parent-relative (`../notesSlides/...`)
/// forms.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        return stripped.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

// ── Notes text extraction ────────────────────────────────────────────────

/// Extract the text of the notes slide's `body` placeholder.
///
/// A notes slide also contains a slide-image placeholder and a slide-number
/// placeholder; only the body carries the speaker's words. Text nodes are
/// not trimmed — notes are reproduced verbatim, paragraphs joined with `\n`.
fn notes_body_text(notes_xml: &str, deck: &Path) -> Result<String, SlidecastError> {
    let mut reader = Reader::from_str(notes_xml);

    let mut in_shape = false;
    let mut ph_type: Option<String> = None;
    let mut in_text_body = false;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    ph_type = None;
                }
                b"ph" if in_shape => {
                    ph_type = placeholder_type(e);
                }
                b"txBody" if in_shape => {
                    in_text_body = true;
                }
                b"p" if in_text_body && ph_type.as_deref() == Some("body") => {
                    in_paragraph = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" if in_shape => {
                    ph_type = placeholder_type(e);
                }
                b"br" if in_paragraph => {
                    current.push('\n');
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    current.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"txBody" => {
                    in_text_body = false;
                }
                b"sp" => {
                    in_shape = false;
                    ph_type = None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SlidecastError::CorruptDeck {
                    path: deck.to_path_buf(),
                    detail: format!("malformed notes part: {e}"),
                });
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn placeholder_type(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"type" {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    // A `p:ph` with no type attribute is a generic body placeholder.
    Some("body".to_string())
}

// ── Document properties ──────────────────────────────────────────────────

fn parse_core_properties(xml: &str, meta: &mut DeckMetadata) {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current = Some(local_name(e.name().as_ref()).to_vec());
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_deref() {
                    Some(b"title") => meta.title = non_empty(text),
                    Some(b"creator") => meta.author = non_empty(text),
                    Some(b"created") => meta.created = non_empty(text),
                    Some(b"modified") => meta.modified = non_empty(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
}

fn parse_app_properties(xml: &str, meta: &mut DeckMetadata) {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current = Some(local_name(e.name().as_ref()).to_vec());
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_deref() {
                    Some(b"Application") => meta.application = non_empty(text),
                    Some(b"Slides") => meta.slide_count = text.trim().parse().unwrap_or(0),
                    Some(b"HiddenSlides") => {
                        meta.hidden_slides = text.trim().parse().unwrap_or(0)
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Strip an XML namespace prefix: `p:sp` → `sp`.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
