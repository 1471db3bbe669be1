//! Pipeline stages for deck-to-artifacts conversion.
//!
//! Each submodule implements exactly one concern. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (e.g. a different render backend) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ notes ──▶ synth ──▶ assemble
//! (path)   (soffice/   (zip +    (TTS      (ffmpeg,
//!           pdfium)    XML)      exe)       opt-in)
//! ```
//!
//! 1. [`input`]    — validate the user-supplied path as a readable deck
//! 2. [`render`]   — the `SlideRenderer` trait and the soffice/pdfium
//!    production implementation
//! 3. [`notes`]    — speaker-notes and document-properties extraction from
//!    the OOXML package
//! 4. [`synth`]    — per-slide blocking invocation of the external
//!    text-to-speech executable
//! 5. [`assemble`] — optional ffmpeg clip + concat pass over the finished
//!    artifacts

pub mod assemble;
pub mod input;
pub mod notes;
pub mod render;
pub mod synth;
