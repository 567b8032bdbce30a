//! Portable snapshot documents for VerseNote.
//!
//! Three JSON document kinds exist:
//!
//! | kind | shape |
//! |---|---|
//! | notes | `{version: "1.0", exportDate, deviceId?, metadata, data: {key: record}}` |
//! | Bible text | `{version: "1.0", exportDate, metadata, chapters: [...]}` |
//! | combined backup | `{version: "2.0", exportDate, deviceId, notes, bibleTexts}` |
//!
//! [`Document::parse`] detects the kind of a raw document and parses it
//! leniently: a malformed record becomes a per-item error instead of
//! rejecting the whole document. The strict [`deserialize_notes`] /
//! [`deserialize_texts`] functions reject on the first bad item.
//!
//! The [`render`] module produces export-only plain text and HTML views.

pub mod backup;
pub mod document;
pub mod error;
pub mod notes;
pub mod render;
pub mod texts;

pub use backup::{CombinedBackup, BACKUP_VERSION};
pub use document::{Document, DocumentKind, IncomingChapter, IncomingNotes, IncomingRecord, IncomingTexts};
pub use error::{SnapshotError, SnapshotResult};
pub use notes::{deserialize_notes, serialize_notes, NotesMetadata, NotesSnapshot, NOTES_VERSION};
pub use render::{render_html, render_text, HtmlRendering, TextRendering};
pub use texts::{deserialize_texts, serialize_texts, TextMetadata, TextSnapshot, TEXTS_VERSION};

/// Current time as an RFC 3339 string, used for `exportDate`.
pub(crate) fn export_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
