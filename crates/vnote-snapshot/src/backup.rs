use serde::{Deserialize, Serialize};
use vnote_types::{ChapterText, VerseRecord};

use crate::export_timestamp;
use crate::notes::{serialize_notes, NotesSnapshot};
use crate::texts::{serialize_texts, TextSnapshot};

/// Version tag of combined backups.
pub const BACKUP_VERSION: &str = "2.0";

/// Notes and Bible text under one version tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedBackup {
    pub version: String,
    pub export_date: String,
    #[serde(default)]
    pub device_id: Option<String>,
    pub notes: NotesSnapshot,
    pub bible_texts: TextSnapshot,
}

impl CombinedBackup {
    pub fn new(records: &[VerseRecord], chapters: &[ChapterText], device_id: Option<&str>) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            export_date: export_timestamp(),
            device_id: device_id.map(str::to_string),
            notes: serialize_notes(records, device_id),
            bible_texts: serialize_texts(chapters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vnote_types::{PersonalNote, Timestamp, VerseKey};

    #[test]
    fn wraps_both_snapshots() {
        let mut record = VerseRecord::new(VerseKey::single("john", 3, 16).unwrap());
        record.personal_note = Some(PersonalNote::new("x", Timestamp(1)));
        let chapter = ChapterText {
            book_id: "john".into(),
            chapter: 3,
            translation: "KJV".into(),
            data: json!({}),
        };

        let backup = CombinedBackup::new(&[record], &[chapter], Some("tablet"));
        let value = serde_json::to_value(&backup).unwrap();
        assert_eq!(value["version"], "2.0");
        assert_eq!(value["deviceId"], "tablet");
        assert_eq!(value["notes"]["version"], "1.0");
        assert_eq!(value["notes"]["deviceId"], "tablet");
        assert_eq!(value["bibleTexts"]["metadata"]["totalChapters"], 1);
    }

    #[test]
    fn device_id_is_always_present() {
        let backup = CombinedBackup::new(&[], &[], None);
        let value = serde_json::to_value(&backup).unwrap();
        assert!(value.get("deviceId").unwrap().is_null());
    }
}
