//! Cached scripture text, keyed by (book, chapter, translation).
//!
//! Chapter text lives in its own substrate, separate from verse records.

use tracing::debug;
use vnote_types::{chapter_key, ChapterText};

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// Store of [`ChapterText`] values.
#[derive(Debug)]
pub struct ChapterTextStore<S: KvStore> {
    kv: S,
}

impl<S: KvStore> ChapterTextStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn get(&self, book_id: &str, chapter: u32, translation: &str) -> StoreResult<Option<ChapterText>> {
        let key = chapter_key(book_id, chapter, translation);
        self.kv.get(&key)?.map(|b| decode(&key, &b)).transpose()
    }

    /// Create or replace a chapter. The chapter is validated first.
    pub fn put(&self, text: &ChapterText) -> StoreResult<()> {
        text.validate()?;
        let bytes = serde_json::to_vec(text).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let key = text.storage_key();
        self.kv.put(&key, &bytes)?;
        debug!(key = %key, "chapter text written");
        Ok(())
    }

    pub fn delete(&self, book_id: &str, chapter: u32, translation: &str) -> StoreResult<bool> {
        self.kv.delete(&chapter_key(book_id, chapter, translation))
    }

    /// Every cached chapter, in no particular order.
    pub fn scan_all(&self) -> StoreResult<Vec<ChapterText>> {
        self.kv
            .scan()?
            .into_iter()
            .map(|(key, bytes)| decode(&key, &bytes))
            .collect()
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.kv.clear()
    }
}

fn decode(key: &str, bytes: &[u8]) -> StoreResult<ChapterText> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKvStore;
    use serde_json::json;

    fn chapter(book: &str, n: u32, tr: &str) -> ChapterText {
        ChapterText {
            book_id: book.into(),
            chapter: n,
            translation: tr.into(),
            data: json!({"verses": {"1": "In the beginning"}}),
        }
    }

    #[test]
    fn put_get_delete() {
        let store = ChapterTextStore::new(InMemoryKvStore::new());
        let text = chapter("genesis", 1, "KJV");
        store.put(&text).unwrap();

        assert_eq!(store.get("genesis", 1, "kjv").unwrap(), Some(text.clone()));
        assert_eq!(store.get("genesis", 1, "KJV").unwrap(), Some(text));
        assert!(store.get("genesis", 2, "KJV").unwrap().is_none());

        assert!(store.delete("genesis", 1, "KJV").unwrap());
        assert!(store.scan_all().unwrap().is_empty());
    }

    #[test]
    fn translations_are_separate_entries() {
        let store = ChapterTextStore::new(InMemoryKvStore::new());
        store.put(&chapter("john", 1, "KJV")).unwrap();
        store.put(&chapter("john", 1, "ESV")).unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 2);
        store.clear().unwrap();
        assert!(store.scan_all().unwrap().is_empty());
    }

    #[test]
    fn invalid_chapter_is_rejected() {
        let store = ChapterTextStore::new(InMemoryKvStore::new());
        assert!(matches!(
            store.put(&chapter("john", 0, "KJV")),
            Err(StoreError::Validation(_))
        ));
    }
}
