//! Building snapshot documents from the live stores.

use tracing::info;
use vnote_snapshot::{serialize_notes, serialize_texts, CombinedBackup, NotesSnapshot, TextSnapshot};
use vnote_store::{ChapterTextStore, KvStore, VerseRecordStore};

use crate::error::MergeResult;

/// Snapshot every verse record.
pub fn export_notes<S: KvStore>(
    records: &VerseRecordStore<S>,
    device_id: Option<&str>,
) -> MergeResult<NotesSnapshot> {
    let snapshot = serialize_notes(&records.scan_all()?, device_id);
    info!(
        records = snapshot.data.len(),
        notes = snapshot.metadata.total_notes,
        research = snapshot.metadata.total_research,
        "exported notes"
    );
    Ok(snapshot)
}

/// Snapshot every cached chapter.
pub fn export_texts<S: KvStore>(texts: &ChapterTextStore<S>) -> MergeResult<TextSnapshot> {
    let snapshot = serialize_texts(&texts.scan_all()?);
    info!(chapters = snapshot.metadata.total_chapters, "exported bible texts");
    Ok(snapshot)
}

/// Snapshot both stores into one combined backup.
pub fn export_backup<N: KvStore, T: KvStore>(
    records: &VerseRecordStore<N>,
    texts: &ChapterTextStore<T>,
    device_id: Option<&str>,
) -> MergeResult<CombinedBackup> {
    let backup = CombinedBackup::new(&records.scan_all()?, &texts.scan_all()?, device_id);
    info!(
        records = backup.notes.data.len(),
        chapters = backup.bible_texts.metadata.total_chapters,
        "exported combined backup"
    );
    Ok(backup)
}
