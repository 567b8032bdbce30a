//! The verse record store.
//!
//! [`VerseRecordStore`] is the only writer of verse records. Every mutation
//! funnels through [`VerseRecordStore::update`], which holds the key's lock
//! for the whole read-modify-write and enforces the sparse-store rule: a
//! record with no note and no research is deleted, never written.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};
use vnote_types::{Clock, PersonalNote, SystemClock, Timestamp, VerseKey, VerseRecord};

use crate::error::{StoreError, StoreResult};
use crate::locks::KeyLocks;
use crate::research::{new_entry_id, non_empty_tags, ResearchDraft};
use crate::traits::KvStore;

/// Outcome of an [`update`](VerseRecordStore::update) closure.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordChange {
    /// Leave the stored record untouched.
    Keep,
    /// Store this record. An empty record removes the key instead.
    Put(VerseRecord),
    /// Remove the record.
    Remove,
}

/// Aggregate counts over the whole store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub records: usize,
    pub notes: usize,
    pub research_entries: usize,
    /// Distinct book ids, in canonical order.
    pub books: Vec<&'static str>,
}

impl StoreStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VerseRecord>) -> Self {
        let mut stats = Self::default();
        let mut books = BTreeSet::new();
        for record in records {
            stats.records += 1;
            stats.notes += usize::from(record.personal_note.is_some());
            stats.research_entries += record.ai_research.len();
            books.insert((record.key.book().order, record.key.book_id()));
        }
        stats.books = books.into_iter().map(|(_, id)| id).collect();
        stats
    }
}

/// CRUD over verse-keyed records on top of a [`KvStore`] substrate.
pub struct VerseRecordStore<S: KvStore> {
    kv: S,
    clock: Arc<dyn Clock>,
    locks: KeyLocks,
}

impl<S: KvStore> VerseRecordStore<S> {
    /// A store stamping records with the system clock.
    pub fn new(kv: S) -> Self {
        Self::with_clock(kv, Arc::new(SystemClock))
    }

    pub fn with_clock(kv: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            locks: KeyLocks::new(),
        }
    }

    /// The underlying substrate.
    pub fn substrate(&self) -> &S {
        &self.kv
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Point lookup. No side effects.
    pub fn get(&self, key: &VerseKey) -> StoreResult<Option<VerseRecord>> {
        self.load(&key.to_string())
    }

    /// Replace the note at `key`, creating the record if needed.
    ///
    /// `updated_at` is stamped with the current time. `created_at` is taken
    /// from the existing note if there is one, otherwise from `note` clamped
    /// to the current time. Returns the note as stored.
    pub fn save_note(&self, key: &VerseKey, note: PersonalNote) -> StoreResult<PersonalNote> {
        let now = self.clock.now();
        self.modify(key, |record| {
            let created_at = record
                .personal_note
                .as_ref()
                .map(|n| n.created_at)
                .unwrap_or_else(|| note.created_at.min(now));
            let stored = PersonalNote {
                created_at,
                updated_at: now.max(created_at),
                ..note
            };
            record.personal_note = Some(stored.clone());
            stored
        })
    }

    /// Remove the note at `key`. Deletes the record if no research remains.
    pub fn delete_note(&self, key: &VerseKey) -> StoreResult<()> {
        self.modify(key, |record| {
            record.personal_note = None;
        })
    }

    /// Append a research entry, creating the record if needed.
    /// Returns the new entry's id.
    pub fn add_research(&self, key: &VerseKey, draft: ResearchDraft) -> StoreResult<String> {
        let now = self.clock.now();
        self.modify(key, |record| {
            let mut id = new_entry_id();
            while record.has_research(&id) {
                id = new_entry_id();
            }
            record.ai_research.push(draft.into_entry(id.clone(), now));
            id
        })
    }

    /// Remove the research entry `id`. Returns `true` if it existed.
    /// Deletes the record if nothing remains.
    pub fn delete_research(&self, key: &VerseKey, id: &str) -> StoreResult<bool> {
        self.modify(key, |record| {
            let before = record.ai_research.len();
            record.ai_research.retain(|e| e.id != id);
            record.ai_research.len() != before
        })
    }

    /// Replace the tags of research entry `id`. Returns `true` if the entry exists.
    pub fn set_research_tags(&self, key: &VerseKey, id: &str, tags: Vec<String>) -> StoreResult<bool> {
        self.modify(key, |record| match record.research_mut(id) {
            Some(entry) => {
                entry.tags = non_empty_tags(tags);
                true
            }
            None => false,
        })
    }

    /// Replace the highlighted passages of research entry `id`.
    /// Returns `true` if the entry exists.
    pub fn set_research_highlights(
        &self,
        key: &VerseKey,
        id: &str,
        highlighted: Vec<String>,
    ) -> StoreResult<bool> {
        self.modify(key, |record| match record.research_mut(id) {
            Some(entry) => {
                entry.highlighted = (!highlighted.is_empty()).then_some(highlighted);
                true
            }
            None => false,
        })
    }

    /// Every record in the store, in no particular order.
    pub fn scan_all(&self) -> StoreResult<Vec<VerseRecord>> {
        self.kv
            .scan()?
            .into_iter()
            .map(|(key, bytes)| decode(&key, &bytes))
            .collect()
    }

    /// Remove every record. Idempotent.
    pub fn clear(&self) -> StoreResult<()> {
        let _guards = self.locks.lock_all()?;
        self.kv.clear()?;
        info!("cleared verse record store");
        Ok(())
    }

    /// Records for any verses in one chapter, in canonical order.
    pub fn records_in_chapter(&self, book_id: &str, chapter: u32) -> StoreResult<Vec<VerseRecord>> {
        let mut out: Vec<VerseRecord> = self
            .scan_all()?
            .into_iter()
            .filter(|r| r.key.book_id() == book_id && r.key.chapter() == chapter)
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    /// Records whose verse set includes `verse`, in canonical order.
    pub fn records_covering(
        &self,
        book_id: &str,
        chapter: u32,
        verse: u32,
    ) -> StoreResult<Vec<VerseRecord>> {
        let mut out = self.records_in_chapter(book_id, chapter)?;
        out.retain(|r| r.key.covers(verse));
        Ok(out)
    }

    /// Case-insensitive substring search over note text and research.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> StoreResult<Vec<VerseRecord>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let mut out: Vec<VerseRecord> = self
            .scan_all()?
            .into_iter()
            .filter(|r| record_matches(r, &needle))
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats::from_records(&self.scan_all()?))
    }

    /// Run a read-modify-write on one key under that key's lock.
    ///
    /// `f` receives the current record (if any) and decides what to store.
    /// A [`RecordChange::Put`] of an empty record deletes the key.
    pub fn update<T>(
        &self,
        key: &VerseKey,
        f: impl FnOnce(Option<VerseRecord>) -> (RecordChange, T),
    ) -> StoreResult<T> {
        let key_str = key.to_string();
        let _guard = self.locks.lock(&key_str)?;
        let existing = self.load(&key_str)?;
        let existed = existing.is_some();

        let (change, out) = f(existing);
        match change {
            RecordChange::Keep => {}
            RecordChange::Put(record) if record.key != *key => {
                return Err(StoreError::KeyMismatch {
                    expected: key_str,
                    found: record.key.to_string(),
                });
            }
            RecordChange::Put(record) if record.is_empty() => {
                if existed {
                    self.kv.delete(&key_str)?;
                    debug!(key = %key_str, "record emptied, removed");
                }
            }
            RecordChange::Put(record) => {
                self.kv.put(&key_str, &encode(&record)?)?;
                debug!(key = %key_str, "record written");
            }
            RecordChange::Remove => {
                if self.kv.delete(&key_str)? {
                    debug!(key = %key_str, "record removed");
                }
            }
        }
        Ok(out)
    }

    /// Get-or-create the record at `key`, mutate it and persist the result.
    fn modify<T>(&self, key: &VerseKey, f: impl FnOnce(&mut VerseRecord) -> T) -> StoreResult<T> {
        self.update(key, |existing| {
            let mut record = existing.clone().unwrap_or_else(|| VerseRecord::new(key.clone()));
            let out = f(&mut record);
            let change = if existing.as_ref() == Some(&record) {
                RecordChange::Keep
            } else if record.is_empty() && existing.is_none() {
                RecordChange::Keep
            } else {
                RecordChange::Put(record)
            };
            (change, out)
        })
    }

    fn load(&self, key: &str) -> StoreResult<Option<VerseRecord>> {
        self.kv
            .get(key)?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }
}

fn decode(key: &str, bytes: &[u8]) -> StoreResult<VerseRecord> {
    let record: VerseRecord = serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if record.key.to_string() != key {
        return Err(StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("stored record belongs to {}", record.key),
        });
    }
    Ok(record)
}

fn encode(record: &VerseRecord) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn record_matches(record: &VerseRecord, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    if record
        .personal_note
        .as_ref()
        .is_some_and(|n| hit(n.plain_text().as_str()))
    {
        return true;
    }
    record.ai_research.iter().any(|e| {
        hit(e.query.as_str())
            || hit(e.response.as_str())
            || e.selected_text.as_deref().is_some_and(hit)
            || e.tags.iter().flatten().any(|t| hit(t.as_str()))
    })
}

impl<S: KvStore + std::fmt::Debug> std::fmt::Debug for VerseRecordStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerseRecordStore").field("kv", &self.kv).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKvStore;
    use serde_json::json;
    use vnote_types::ManualClock;

    fn store_at(ms: u64) -> (VerseRecordStore<InMemoryKvStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Timestamp(ms)));
        let store = VerseRecordStore::with_clock(InMemoryKvStore::new(), clock.clone());
        (store, clock)
    }

    fn key(book: &str, chapter: u32, verses: &[u32]) -> VerseKey {
        VerseKey::new(book, chapter, verses.iter().copied()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    #[test]
    fn save_note_creates_record_and_stamps_update() {
        let (store, _clock) = store_at(1_000);
        let k = key("john", 3, &[16]);
        let note = PersonalNote::new("<p>For God so loved</p>", Timestamp(900));

        store.save_note(&k, note.clone()).unwrap();

        let record = store.get(&k).unwrap().expect("record should exist");
        let stored = record.personal_note.unwrap();
        assert_eq!(stored.text, note.text);
        assert_eq!(stored.created_at, Timestamp(900));
        assert_eq!(stored.updated_at, Timestamp(1_000));
    }

    #[test]
    fn save_note_preserves_created_at_of_existing_note() {
        let (store, clock) = store_at(1_000);
        let k = key("john", 3, &[16]);
        store.save_note(&k, PersonalNote::new("first", Timestamp(1_000))).unwrap();

        clock.advance(500);
        store.save_note(&k, PersonalNote::new("second", Timestamp(1_500))).unwrap();

        let note = store.get(&k).unwrap().unwrap().personal_note.unwrap();
        assert_eq!(note.text, json!("second"));
        assert_eq!(note.created_at, Timestamp(1_000));
        assert_eq!(note.updated_at, Timestamp(1_500));
    }

    #[test]
    fn future_created_at_is_clamped_to_now() {
        let (store, _clock) = store_at(10);
        let k = key("john", 1, &[1]);
        let stored = store.save_note(&k, PersonalNote::new("x", Timestamp(50))).unwrap();
        assert_eq!(stored.created_at, Timestamp(10));
        assert_eq!(stored.updated_at, Timestamp(10));
        assert_eq!(store.get(&k).unwrap().unwrap().personal_note, Some(stored));
    }

    #[test]
    fn verse_order_does_not_split_records() {
        let (store, _clock) = store_at(1);
        store.save_note(&key("romans", 8, &[29, 28]), PersonalNote::new("a", Timestamp(1))).unwrap();
        store.save_note(&key("romans", 8, &[28, 29]), PersonalNote::new("b", Timestamp(1))).unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn delete_note_without_research_removes_record() {
        let (store, _clock) = store_at(1);
        let k = key("john", 3, &[16]);
        store.save_note(&k, PersonalNote::new("x", Timestamp(1))).unwrap();
        store.delete_note(&k).unwrap();
        assert!(store.get(&k).unwrap().is_none());
        assert!(store.substrate().is_empty());
    }

    #[test]
    fn delete_note_keeps_record_with_research() {
        let (store, _clock) = store_at(1);
        let k = key("john", 3, &[16]);
        store.save_note(&k, PersonalNote::new("x", Timestamp(1))).unwrap();
        store.add_research(&k, ResearchDraft::new("q", "a")).unwrap();

        store.delete_note(&k).unwrap();
        let record = store.get(&k).unwrap().unwrap();
        assert!(record.personal_note.is_none());
        assert_eq!(record.ai_research.len(), 1);
    }

    #[test]
    fn deletes_on_missing_key_are_noops() {
        let (store, _clock) = store_at(1);
        let k = key("jude", 1, &[3]);
        store.delete_note(&k).unwrap();
        assert!(!store.delete_research(&k, "nope").unwrap());
        assert!(store.substrate().is_empty());
    }

    // -----------------------------------------------------------------------
    // Research
    // -----------------------------------------------------------------------

    #[test]
    fn add_research_appends_in_insertion_order() {
        let (store, clock) = store_at(100);
        let k = key("genesis", 1, &[1]);
        let first = store.add_research(&k, ResearchDraft::new("q1", "a1")).unwrap();
        clock.advance(1);
        let second = store.add_research(&k, ResearchDraft::new("q2", "a2")).unwrap();
        assert_ne!(first, second);

        let record = store.get(&k).unwrap().unwrap();
        let ids: Vec<&str> = record.ai_research.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
        assert_eq!(record.ai_research[0].timestamp, Timestamp(100));
        assert_eq!(record.ai_research[1].timestamp, Timestamp(101));
    }

    #[test]
    fn delete_research_removes_exactly_one_entry() {
        let (store, _clock) = store_at(1);
        let k = key("genesis", 1, &[1]);
        let a = store.add_research(&k, ResearchDraft::new("a", "a")).unwrap();
        let b = store.add_research(&k, ResearchDraft::new("b", "b")).unwrap();
        let c = store.add_research(&k, ResearchDraft::new("c", "c")).unwrap();

        assert!(store.delete_research(&k, &b).unwrap());
        let ids: Vec<String> = store
            .get(&k)
            .unwrap()
            .unwrap()
            .ai_research
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn deleting_last_research_without_note_removes_record() {
        let (store, _clock) = store_at(1);
        let k = key("genesis", 1, &[1]);
        let id = store.add_research(&k, ResearchDraft::new("q", "a")).unwrap();
        assert!(store.delete_research(&k, &id).unwrap());
        assert!(store.get(&k).unwrap().is_none());
    }

    #[test]
    fn research_tags_and_highlights_update_in_place() {
        let (store, clock) = store_at(5);
        let k = key("psalms", 23, &[1]);
        let id = store.add_research(&k, ResearchDraft::new("q", "a")).unwrap();
        clock.advance(100);

        assert!(store
            .set_research_tags(&k, &id, vec![" shepherd ".into(), "".into()])
            .unwrap());
        assert!(store
            .set_research_highlights(&k, &id, vec!["the Lord".into()])
            .unwrap());
        assert!(!store.set_research_tags(&k, "missing", vec!["x".into()]).unwrap());

        let entry = store.get(&k).unwrap().unwrap().ai_research.remove(0);
        assert_eq!(entry.id, id);
        assert_eq!(entry.timestamp, Timestamp(5));
        assert_eq!(entry.tags, Some(vec!["shepherd".to_string()]));
        assert_eq!(entry.highlighted, Some(vec!["the Lord".to_string()]));
    }

    #[test]
    fn set_tags_on_missing_key_creates_nothing() {
        let (store, _clock) = store_at(1);
        let k = key("psalms", 1, &[1]);
        assert!(!store.set_research_tags(&k, "id", vec!["a".into()]).unwrap());
        assert!(store.substrate().is_empty());
    }

    // -----------------------------------------------------------------------
    // Whole-store operations
    // -----------------------------------------------------------------------

    #[test]
    fn scan_and_clear() {
        let (store, _clock) = store_at(1);
        store.save_note(&key("john", 3, &[16]), PersonalNote::new("a", Timestamp(1))).unwrap();
        store.add_research(&key("acts", 2, &[1]), ResearchDraft::new("q", "a")).unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 2);

        store.clear().unwrap();
        assert!(store.scan_all().unwrap().is_empty());
        store.clear().unwrap();
    }

    #[test]
    fn chapter_and_verse_queries() {
        let (store, _clock) = store_at(1);
        store.save_note(&key("john", 3, &[17]), PersonalNote::new("a", Timestamp(1))).unwrap();
        store.save_note(&key("john", 3, &[15, 16]), PersonalNote::new("b", Timestamp(1))).unwrap();
        store.save_note(&key("john", 4, &[16]), PersonalNote::new("c", Timestamp(1))).unwrap();

        let chapter = store.records_in_chapter("john", 3).unwrap();
        let keys: Vec<String> = chapter.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["john_3_15,16", "john_3_17"]);

        let covering = store.records_covering("john", 3, 16).unwrap();
        assert_eq!(covering.len(), 1);
        assert_eq!(covering[0].key.to_string(), "john_3_15,16");
    }

    #[test]
    fn search_matches_notes_and_research() {
        let (store, _clock) = store_at(1);
        store
            .save_note(&key("john", 3, &[16]), PersonalNote::new("<p>God so <b>LOVED</b></p>", Timestamp(1)))
            .unwrap();
        store
            .add_research(
                &key("1john", 4, &[8]),
                ResearchDraft::new("What is love?", "Agape").with_tags(["charity"]),
            )
            .unwrap();
        store.save_note(&key("acts", 1, &[1]), PersonalNote::new("Theophilus", Timestamp(1))).unwrap();

        let hits: Vec<String> = store
            .search("love")
            .unwrap()
            .iter()
            .map(|r| r.key.to_string())
            .collect();
        assert_eq!(hits, vec!["john_3_16", "1john_4_8"]);
        assert_eq!(store.search("CHARITY").unwrap().len(), 1);
        assert!(store.search("   ").unwrap().is_empty());
    }

    #[test]
    fn stats_count_notes_research_and_books() {
        let (store, _clock) = store_at(1);
        let k = key("john", 3, &[16]);
        store.save_note(&k, PersonalNote::new("a", Timestamp(1))).unwrap();
        store.add_research(&k, ResearchDraft::new("q", "a")).unwrap();
        store.add_research(&key("genesis", 1, &[1]), ResearchDraft::new("q", "a")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.notes, 1);
        assert_eq!(stats.research_entries, 2);
        assert_eq!(stats.books, vec!["genesis", "john"]);
    }

    // -----------------------------------------------------------------------
    // Update contract and failures
    // -----------------------------------------------------------------------

    #[test]
    fn update_put_of_empty_record_deletes() {
        let (store, _clock) = store_at(1);
        let k = key("john", 3, &[16]);
        store.save_note(&k, PersonalNote::new("a", Timestamp(1))).unwrap();
        store
            .update(&k, |_| (RecordChange::Put(VerseRecord::new(k.clone())), ()))
            .unwrap();
        assert!(store.get(&k).unwrap().is_none());
    }

    #[test]
    fn update_rejects_foreign_record() {
        let (store, _clock) = store_at(1);
        let k = key("john", 3, &[16]);
        let mut other = VerseRecord::new(key("john", 3, &[17]));
        other.personal_note = Some(PersonalNote::new("x", Timestamp(1)));
        let err = store.update(&k, |_| (RecordChange::Put(other), ())).unwrap_err();
        assert!(matches!(err, StoreError::KeyMismatch { .. }));
        assert!(store.substrate().is_empty());
    }

    #[test]
    fn persistence_failure_is_surfaced() {
        let (store, _clock) = store_at(1);
        store.substrate().set_read_only(true);
        let err = store
            .save_note(&key("john", 3, &[16]), PersonalNote::new("x", Timestamp(1)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        let err = store
            .add_research(&key("john", 3, &[16]), ResearchDraft::new("q", "a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }

    #[test]
    fn corrupt_stored_record_is_reported() {
        let (store, _clock) = store_at(1);
        store.substrate().put("john_3_16", b"not json").unwrap();
        let k = key("john", 3, &[16]);
        assert!(matches!(store.get(&k), Err(StoreError::Corrupt { .. })));
        assert!(matches!(store.scan_all(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn concurrent_research_adds_are_not_lost() {
        use std::thread;

        let store = Arc::new(VerseRecordStore::new(InMemoryKvStore::new()));
        let k = key("john", 3, &[16]);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let k = k.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        store
                            .add_research(&k, ResearchDraft::new(format!("q{i}-{j}"), "a"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(store.get(&k).unwrap().unwrap().ai_research.len(), 200);
    }
}
