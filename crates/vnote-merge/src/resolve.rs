//! Per-key conflict resolution. Pure functions, no store access.

use std::collections::HashSet;

use vnote_types::{ChapterText, VerseRecord};

use crate::strategy::MergeStrategy;

/// What to do with one incoming item.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    Import(T),
    Skip,
}

/// Decide the fate of `incoming` given the record already stored at its key.
pub fn resolve_record(
    strategy: MergeStrategy,
    existing: Option<&VerseRecord>,
    incoming: VerseRecord,
) -> Resolution<VerseRecord> {
    let Some(existing) = existing else {
        return Resolution::Import(incoming);
    };
    match strategy {
        MergeStrategy::Replace => Resolution::Import(incoming),
        MergeStrategy::MergeNewer => {
            if incoming.note_updated_at() > existing.note_updated_at() {
                Resolution::Import(incoming)
            } else {
                Resolution::Skip
            }
        }
        MergeStrategy::MergeCombine => Resolution::Import(combine(existing, &incoming)),
        MergeStrategy::SkipExisting => Resolution::Skip,
    }
}

/// Combine two records for the same key.
///
/// The note with the strictly greater `updatedAt` wins, ties keep the
/// existing one. A note present on only one side is always kept. Research is the existing list in order followed by incoming
/// entries with ids not seen yet.
pub fn combine(existing: &VerseRecord, incoming: &VerseRecord) -> VerseRecord {
    let personal_note = match (&existing.personal_note, &incoming.personal_note) {
        (Some(mine), Some(theirs)) if theirs.updated_at > mine.updated_at => Some(theirs.clone()),
        (Some(mine), _) => Some(mine.clone()),
        (None, theirs) => theirs.clone(),
    };

    let mut seen: HashSet<&str> = existing.ai_research.iter().map(|e| e.id.as_str()).collect();
    let mut ai_research = existing.ai_research.clone();
    for entry in &incoming.ai_research {
        if seen.insert(entry.id.as_str()) {
            ai_research.push(entry.clone());
        }
    }

    VerseRecord {
        key: existing.key.clone(),
        personal_note,
        ai_research,
    }
}

/// Decide the fate of an incoming chapter. Only `skip_existing` keeps a
/// present chapter unconditionally; the others overwrite when the content
/// differs.
pub fn resolve_chapter(
    strategy: MergeStrategy,
    existing: Option<&ChapterText>,
    incoming: ChapterText,
) -> Resolution<ChapterText> {
    match existing {
        None => Resolution::Import(incoming),
        Some(_) if strategy == MergeStrategy::SkipExisting => Resolution::Skip,
        Some(current) if current.data == incoming.data => Resolution::Skip,
        Some(_) => Resolution::Import(incoming),
    }
}
