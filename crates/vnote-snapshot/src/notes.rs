//! The notes/research snapshot (`version: "1.0"` with a `data` map).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vnote_types::{VerseKey, VerseRecord};

use crate::document::{IncomingNotes, IncomingRecord};
use crate::error::{SnapshotError, SnapshotResult};
use crate::export_timestamp;

/// Version tag of notes snapshots. Matched exactly on import.
pub const NOTES_VERSION: &str = "1.0";

/// Derived counts carried alongside the records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesMetadata {
    /// Records with a personal note.
    pub total_notes: usize,
    /// Research entries across all records.
    pub total_research: usize,
    /// Distinct book ids. Order is not significant.
    pub books_included: Vec<String>,
}

impl NotesMetadata {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VerseRecord>) -> Self {
        let mut meta = Self::default();
        let mut books = BTreeSet::new();
        for record in records {
            meta.total_notes += usize::from(record.personal_note.is_some());
            meta.total_research += record.ai_research.len();
            books.insert((record.key.book().order, record.key.book_id()));
        }
        meta.books_included = books.into_iter().map(|(_, id)| id.to_string()).collect();
        meta
    }
}

/// A portable copy of every verse record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesSnapshot {
    pub version: String,
    pub export_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub metadata: NotesMetadata,
    pub data: BTreeMap<String, VerseRecord>,
}

impl NotesSnapshot {
    pub fn to_value(&self) -> SnapshotResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Build a notes snapshot from a record set.
pub fn serialize_notes(records: &[VerseRecord], device_id: Option<&str>) -> NotesSnapshot {
    NotesSnapshot {
        version: NOTES_VERSION.to_string(),
        export_date: export_timestamp(),
        device_id: device_id.map(str::to_string),
        metadata: NotesMetadata::from_records(records),
        data: records
            .iter()
            .map(|r| (r.key.to_string(), r.clone()))
            .collect(),
    }
}

/// Strictly parse a notes snapshot: the version must be exactly
/// [`NOTES_VERSION`] and every record must be valid.
pub fn deserialize_notes(doc: &Value) -> SnapshotResult<Vec<VerseRecord>> {
    let obj = doc
        .as_object()
        .ok_or_else(|| SnapshotError::UnrecognizedShape("document is not an object".into()))?;
    match obj.get("version").and_then(Value::as_str) {
        None => return Err(SnapshotError::MissingVersion),
        Some(NOTES_VERSION) => {}
        Some(other) => return Err(SnapshotError::UnsupportedVersion(other.to_string())),
    }
    parse_incoming_notes(obj)?
        .records
        .into_iter()
        .map(|item| {
            item.record
                .map_err(|reason| SnapshotError::InvalidItem { key: item.key, reason })
        })
        .collect()
}

/// Leniently parse the body of a notes snapshot whose version has already
/// been checked. Only a missing or non-object `data` fails the document.
pub(crate) fn parse_incoming_notes(obj: &Map<String, Value>) -> SnapshotResult<IncomingNotes> {
    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| SnapshotError::UnrecognizedShape("notes snapshot has no data map".into()))?;

    let records = data
        .iter()
        .map(|(key, value)| IncomingRecord {
            key: key.clone(),
            record: parse_record(key, value),
        })
        .collect();

    Ok(IncomingNotes {
        export_date: obj.get("exportDate").and_then(Value::as_str).map(str::to_string),
        device_id: obj.get("deviceId").and_then(Value::as_str).map(str::to_string),
        records,
    })
}

/// Parse one record of the `data` map.
///
/// Records written by older exports carry no `bookId`/`chapter`/`verses`;
/// for those the key fields are recovered from the map key. A note updated
/// before it was created is rejected, and repeated research ids keep only
/// their first entry.
fn parse_record(map_key: &str, value: &Value) -> Result<VerseRecord, String> {
    let mut value = value.clone();
    let obj = value
        .as_object_mut()
        .ok_or_else(|| "record is not an object".to_string())?;

    if !obj.contains_key("bookId") {
        let key = VerseKey::parse(map_key).map_err(|e| e.to_string())?;
        obj.insert("bookId".into(), Value::from(key.book_id()));
        obj.insert("chapter".into(), Value::from(key.chapter()));
        obj.insert("verses".into(), Value::from(key.verses().to_vec()));
    }

    let mut record: VerseRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if let Some(note) = &record.personal_note {
        note.validate().map_err(|e| e.to_string())?;
    }
    record.dedup_research();

    let canonical = record.key.to_string();
    if canonical != map_key {
        let same = VerseKey::parse(map_key).map(|k| k == record.key).unwrap_or(false);
        if !same {
            return Err(format!("map key does not match record key {canonical}"));
        }
    }
    Ok(record)
}
