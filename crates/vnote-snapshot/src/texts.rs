//! The Bible-text snapshot (`version: "1.0"` with a `chapters` list).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vnote_types::ChapterText;

use crate::document::{IncomingChapter, IncomingTexts};
use crate::error::{SnapshotError, SnapshotResult};
use crate::export_timestamp;

/// Version tag of Bible-text snapshots.
pub const TEXTS_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetadata {
    pub total_chapters: usize,
    /// Distinct translation tags, sorted.
    pub translations: Vec<String>,
}

/// A portable copy of cached chapter text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSnapshot {
    pub version: String,
    pub export_date: String,
    pub metadata: TextMetadata,
    pub chapters: Vec<ChapterText>,
}

/// Build a text snapshot. Chapters are ordered by book, chapter, translation.
pub fn serialize_texts(chapters: &[ChapterText]) -> TextSnapshot {
    let mut chapters = chapters.to_vec();
    chapters.sort_by(|a, b| {
        book_order(&a.book_id)
            .cmp(&book_order(&b.book_id))
            .then(a.chapter.cmp(&b.chapter))
            .then_with(|| a.translation.cmp(&b.translation))
    });
    let translations: BTreeSet<String> = chapters.iter().map(|c| c.translation.clone()).collect();
    TextSnapshot {
        version: TEXTS_VERSION.to_string(),
        export_date: export_timestamp(),
        metadata: TextMetadata {
            total_chapters: chapters.len(),
            translations: translations.into_iter().collect(),
        },
        chapters,
    }
}

fn book_order(id: &str) -> usize {
    vnote_types::find_book(id).map(|b| b.order).unwrap_or(usize::MAX)
}

/// Strictly parse a text snapshot.
pub fn deserialize_texts(doc: &Value) -> SnapshotResult<Vec<ChapterText>> {
    let obj = doc
        .as_object()
        .ok_or_else(|| SnapshotError::UnrecognizedShape("document is not an object".into()))?;
    match obj.get("version").and_then(Value::as_str) {
        None => return Err(SnapshotError::MissingVersion),
        Some(TEXTS_VERSION) => {}
        Some(other) => return Err(SnapshotError::UnsupportedVersion(other.to_string())),
    }
    parse_incoming_texts(obj)?
        .chapters
        .into_iter()
        .map(|item| {
            item.chapter
                .map_err(|reason| SnapshotError::InvalidItem { key: item.label, reason })
        })
        .collect()
}

/// Leniently parse the body of a text snapshot.
pub(crate) fn parse_incoming_texts(obj: &Map<String, Value>) -> SnapshotResult<IncomingTexts> {
    let items = obj
        .get("chapters")
        .and_then(Value::as_array)
        .ok_or_else(|| SnapshotError::UnrecognizedShape("text snapshot has no chapters list".into()))?;

    let chapters = items
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let parsed = serde_json::from_value::<ChapterText>(value.clone())
                .map_err(|e| e.to_string())
                .and_then(|c| c.validate().map(|_| c).map_err(|e| e.to_string()));
            let label = match &parsed {
                Ok(c) => c.storage_key(),
                Err(_) => format!("chapters[{i}]"),
            };
            IncomingChapter { label, chapter: parsed }
        })
        .collect();

    Ok(IncomingTexts {
        export_date: obj.get("exportDate").and_then(Value::as_str).map(str::to_string),
        chapters,
    })
}
