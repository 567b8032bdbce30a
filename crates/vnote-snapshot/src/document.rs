//! Detection and lenient parsing of imported documents.
//!
//! The shape decides the kind:
//!
//! - `version == "2.0"` with `notes` and `bibleTexts` → combined backup
//! - `version == "1.0"` with `data` → notes snapshot
//! - `version == "1.0"` with `chapters` → Bible-text snapshot
//!
//! Anything else is a [`SnapshotError`]. Detection and parsing finish before
//! any caller touches a store, so a rejected document has no side effects.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;
use vnote_types::{ChapterText, VerseRecord};

use crate::backup::BACKUP_VERSION;
use crate::error::{SnapshotError, SnapshotResult};
use crate::notes::{parse_incoming_notes, NOTES_VERSION};
use crate::texts::{parse_incoming_texts, TEXTS_VERSION};

/// One entry of an incoming `data` map. `record` holds the parse failure
/// for entries that could not be read.
#[derive(Clone, Debug, PartialEq)]
pub struct IncomingRecord {
    pub key: String,
    pub record: Result<VerseRecord, String>,
}

/// One entry of an incoming `chapters` list. `label` is the storage key when
/// the chapter parsed, otherwise its position.
#[derive(Clone, Debug, PartialEq)]
pub struct IncomingChapter {
    pub label: String,
    pub chapter: Result<ChapterText, String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingNotes {
    pub export_date: Option<String>,
    pub device_id: Option<String>,
    pub records: Vec<IncomingRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingTexts {
    pub export_date: Option<String>,
    pub chapters: Vec<IncomingChapter>,
}

/// The kind of an imported document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Combined,
    Notes,
    Texts,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Combined => "combined backup",
            DocumentKind::Notes => "notes snapshot",
            DocumentKind::Texts => "Bible text snapshot",
        };
        f.write_str(name)
    }
}

/// A parsed imported document.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Combined {
        device_id: Option<String>,
        notes: IncomingNotes,
        texts: IncomingTexts,
    },
    Notes(IncomingNotes),
    Texts(IncomingTexts),
}

impl Document {
    /// Parse raw JSON text.
    pub fn parse(raw: &str) -> SnapshotResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    /// Detect the kind of `value` and parse it.
    pub fn from_value(value: &Value) -> SnapshotResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| SnapshotError::UnrecognizedShape("document is not an object".into()))?;
        let version = obj
            .get("version")
            .and_then(Value::as_str)
            .ok_or(SnapshotError::MissingVersion)?;

        let doc = match version {
            BACKUP_VERSION => Self::combined(obj)?,
            NOTES_VERSION if obj.contains_key("data") && obj.contains_key("chapters") => {
                return Err(SnapshotError::UnrecognizedShape(
                    "document has both data and chapters".into(),
                ));
            }
            NOTES_VERSION if obj.contains_key("data") => Document::Notes(parse_incoming_notes(obj)?),
            TEXTS_VERSION if obj.contains_key("chapters") => Document::Texts(parse_incoming_texts(obj)?),
            NOTES_VERSION => {
                return Err(SnapshotError::UnrecognizedShape(
                    "version 1.0 document has neither data nor chapters".into(),
                ));
            }
            other => return Err(SnapshotError::UnsupportedVersion(other.to_string())),
        };
        debug!(kind = %doc.kind(), "detected import document");
        Ok(doc)
    }

    fn combined(obj: &Map<String, Value>) -> SnapshotResult<Self> {
        let notes = obj
            .get("notes")
            .and_then(Value::as_object)
            .ok_or_else(|| SnapshotError::UnrecognizedShape("backup has no notes section".into()))?;
        let texts = obj
            .get("bibleTexts")
            .and_then(Value::as_object)
            .ok_or_else(|| SnapshotError::UnrecognizedShape("backup has no bibleTexts section".into()))?;

        expect_version(notes, NOTES_VERSION, "notes")?;
        expect_version(texts, TEXTS_VERSION, "bibleTexts")?;

        Ok(Document::Combined {
            device_id: obj.get("deviceId").and_then(Value::as_str).map(str::to_string),
            notes: parse_incoming_notes(notes)?,
            texts: parse_incoming_texts(texts)?,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Combined { .. } => DocumentKind::Combined,
            Document::Notes(_) => DocumentKind::Notes,
            Document::Texts(_) => DocumentKind::Texts,
        }
    }

    /// The notes section, if the document has one.
    pub fn notes(&self) -> Option<&IncomingNotes> {
        match self {
            Document::Combined { notes, .. } | Document::Notes(notes) => Some(notes),
            Document::Texts(_) => None,
        }
    }

    /// The Bible-text section, if the document has one.
    pub fn texts(&self) -> Option<&IncomingTexts> {
        match self {
            Document::Combined { texts, .. } | Document::Texts(texts) => Some(texts),
            Document::Notes(_) => None,
        }
    }
}

fn expect_version(obj: &Map<String, Value>, expected: &str, section: &str) -> SnapshotResult<()> {
    match obj.get("version").and_then(Value::as_str) {
        Some(v) if v == expected => Ok(()),
        Some(v) => Err(SnapshotError::UnsupportedVersion(format!("{section} section version {v}"))),
        None => Err(SnapshotError::MissingVersion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notes_doc() -> Value {
        json!({"version": "1.0", "exportDate": "2024-01-01T00:00:00Z", "deviceId": "phone",
            "metadata": {"totalNotes": 1, "totalResearch": 0, "booksIncluded": ["john"]},
            "data": {"john_3_16": {"bookId": "john", "chapter": 3, "verses": [16],
                "personalNote": {"text": "x", "createdAt": 1, "updatedAt": 2}}}})
    }

    fn texts_doc() -> Value {
        json!({"version": "1.0", "exportDate": "2024-01-01T00:00:00Z",
            "metadata": {"totalChapters": 1, "translations": ["KJV"]},
            "chapters": [{"bookId": "john", "chapter": 3, "translation": "KJV", "data": {}}]})
    }

    #[test]
    fn detects_notes_snapshot() {
        let doc = Document::from_value(&notes_doc()).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Notes);
        let notes = doc.notes().unwrap();
        assert_eq!(notes.device_id.as_deref(), Some("phone"));
        assert_eq!(notes.records.len(), 1);
        assert!(doc.texts().is_none());
    }

    #[test]
    fn detects_text_snapshot() {
        let doc = Document::from_value(&texts_doc()).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Texts);
        assert_eq!(doc.texts().unwrap().chapters.len(), 1);
        assert!(doc.notes().is_none());
    }

    #[test]
    fn detects_combined_backup() {
        let raw = json!({"version": "2.0", "exportDate": "x", "deviceId": "laptop",
            "notes": notes_doc(), "bibleTexts": texts_doc()})
        .to_string();
        let doc = Document::parse(&raw).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Combined);
        assert_eq!(doc.notes().unwrap().records.len(), 1);
        assert_eq!(doc.texts().unwrap().chapters.len(), 1);
        match doc {
            Document::Combined { device_id, .. } => assert_eq!(device_id.as_deref(), Some("laptop")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn rejects_unknown_versions_and_shapes() {
        let cases = [
            json!({"version": "1.5", "data": {}}),
            json!({"version": "3.0"}),
            json!({"data": {}}),
            json!({"version": "1.0"}),
            json!({"version": "1.0", "data": {}, "chapters": []}),
            json!({"version": "1.0", "data": []}),
            json!({"version": "2.0", "notes": notes_doc()}),
            json!({"version": "2.0", "notes": {"version": "9", "data": {}}, "bibleTexts": texts_doc()}),
            json!([1, 2, 3]),
        ];
        for case in cases {
            assert!(Document::from_value(&case).is_err(), "{case} should be rejected");
        }
    }

    #[test]
    fn unparseable_text_is_a_parse_error() {
        assert!(matches!(Document::parse("{not json"), Err(SnapshotError::Parse(_))));
    }
}
