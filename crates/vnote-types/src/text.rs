use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::book::find_book;
use crate::error::TypeError;
use crate::key::KEY_SEPARATOR;

/// A cached chapter of scripture text in one translation.
///
/// `data` is the chapter payload as delivered by the text provider and is
/// never interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterText {
    pub book_id: String,
    pub chapter: u32,
    pub translation: String,
    pub data: Value,
}

impl ChapterText {
    /// Check the book id, chapter number and translation tag.
    pub fn validate(&self) -> Result<(), TypeError> {
        find_book(&self.book_id).ok_or_else(|| TypeError::UnknownBook(self.book_id.clone()))?;
        if self.chapter == 0 {
            return Err(TypeError::InvalidChapter(self.chapter));
        }
        let t = self.translation.trim();
        if t.is_empty() || t.contains(KEY_SEPARATOR) {
            return Err(TypeError::InvalidTranslation(self.translation.clone()));
        }
        Ok(())
    }

    /// Storage key: `book_chapter_translation`, translation lower-cased.
    pub fn storage_key(&self) -> String {
        chapter_key(&self.book_id, self.chapter, &self.translation)
    }
}

/// Storage key for a chapter of text.
pub fn chapter_key(book_id: &str, chapter: u32, translation: &str) -> String {
    format!(
        "{book_id}{KEY_SEPARATOR}{chapter}{KEY_SEPARATOR}{}",
        translation.trim().to_lowercase()
    )
}
