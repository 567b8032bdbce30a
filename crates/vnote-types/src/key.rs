//! Verse key codec.
//!
//! A [`VerseKey`] names a set of verses inside one chapter of one book. Its
//! canonical string form is `book_chapter_v1,v2,...` with verses sorted
//! ascending and de-duplicated, e.g. `john_3_16` or `romans_8_28,29`.
//! [`canonicalize`] is the single normalization point; every store key is
//! produced through it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::book::{find_book, Book};
use crate::error::TypeError;

/// Separator between book id, chapter and the verse list.
pub const KEY_SEPARATOR: char = '_';

/// Separator between verses in the verse list.
pub const VERSE_SEPARATOR: char = ',';

/// Derive the canonical key string for a (book, chapter, verse-set) tuple.
///
/// Verse order in the input is irrelevant; duplicates collapse.
///
/// ```
/// use vnote_types::canonicalize;
///
/// assert_eq!(canonicalize("john", 3, &[16]).unwrap(), "john_3_16");
/// assert_eq!(canonicalize("romans", 8, &[29, 28]).unwrap(), "romans_8_28,29");
/// assert!(canonicalize("john", 0, &[1]).is_err());
/// ```
pub fn canonicalize(book_id: &str, chapter: u32, verses: &[u32]) -> Result<String, TypeError> {
    Ok(VerseKey::new(book_id, chapter, verses.iter().copied())?.to_string())
}

/// Canonical identifier for a book/chapter/verse-set tuple.
///
/// Construction validates every component, so a `VerseKey` value is always
/// canonical: `verses` is non-empty, sorted ascending and duplicate-free.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VerseKeyRepr", into = "VerseKeyRepr")]
pub struct VerseKey {
    book: &'static Book,
    chapter: u32,
    verses: Vec<u32>,
}

impl VerseKey {
    /// Build a key, validating the book id, chapter and verses.
    pub fn new(
        book_id: &str,
        chapter: u32,
        verses: impl IntoIterator<Item = u32>,
    ) -> Result<Self, TypeError> {
        let book = find_book(book_id).ok_or_else(|| TypeError::UnknownBook(book_id.to_string()))?;
        if chapter == 0 {
            return Err(TypeError::InvalidChapter(chapter));
        }

        let mut verses: Vec<u32> = verses.into_iter().collect();
        if verses.is_empty() {
            return Err(TypeError::EmptyVerses);
        }
        if let Some(&bad) = verses.iter().find(|v| **v == 0) {
            return Err(TypeError::InvalidVerse(bad));
        }
        verses.sort_unstable();
        verses.dedup();

        Ok(Self {
            book,
            chapter,
            verses,
        })
    }

    /// Key for a single verse.
    pub fn single(book_id: &str, chapter: u32, verse: u32) -> Result<Self, TypeError> {
        Self::new(book_id, chapter, [verse])
    }

    /// Parse a canonical key string back into a key.
    ///
    /// Non-canonical verse order is accepted and normalized, so
    /// `parse("john_3_17,16")` yields the key whose string form is
    /// `john_3_16,17`.
    pub fn parse(key: &str) -> Result<Self, TypeError> {
        let malformed = |reason: &str| TypeError::MalformedKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = key.splitn(3, KEY_SEPARATOR);
        let book = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| malformed("missing book"))?;
        let chapter = parts.next().ok_or_else(|| malformed("missing chapter"))?;
        let verses = parts.next().ok_or_else(|| malformed("missing verses"))?;

        let chapter: u32 = chapter.parse().map_err(|_| malformed("chapter is not a number"))?;
        let verses = verses
            .split(VERSE_SEPARATOR)
            .map(|v| v.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed("verse is not a number"))?;

        Self::new(book, chapter, verses)
    }

    pub fn book(&self) -> &'static Book {
        self.book
    }

    pub fn book_id(&self) -> &'static str {
        self.book.id
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    /// Verses, sorted ascending.
    pub fn verses(&self) -> &[u32] {
        &self.verses
    }

    /// Lowest verse number in the set.
    pub fn first_verse(&self) -> u32 {
        self.verses[0]
    }

    /// Returns `true` if `verse` is one of the key's verses.
    pub fn covers(&self, verse: u32) -> bool {
        self.verses.binary_search(&verse).is_ok()
    }

    /// Human-readable reference, e.g. `John 3:16` or `Romans 8:28-29`.
    ///
    /// Consecutive runs are shown as ranges.
    pub fn reference(&self) -> String {
        let mut runs: Vec<String> = Vec::new();
        let mut start = self.verses[0];
        let mut prev = start;
        for &v in &self.verses[1..] {
            if v == prev + 1 {
                prev = v;
                continue;
            }
            runs.push(format_run(start, prev));
            start = v;
            prev = v;
        }
        runs.push(format_run(start, prev));
        format!("{} {}:{}", self.book.name, self.chapter, runs.join(","))
    }
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}", self.book.id, self.chapter)?;
        for (i, v) in self.verses.iter().enumerate() {
            if i > 0 {
                write!(f, "{VERSE_SEPARATOR}")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Canonical reading order: book, then chapter, then verses.
impl Ord for VerseKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.book
            .order
            .cmp(&other.book.order)
            .then(self.chapter.cmp(&other.chapter))
            .then_with(|| self.verses.cmp(&other.verses))
    }
}

impl PartialOrd for VerseKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Wire shape of a key inside a record: `{bookId, chapter, verses}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerseKeyRepr {
    book_id: String,
    chapter: u32,
    verses: Vec<u32>,
}

impl TryFrom<VerseKeyRepr> for VerseKey {
    type Error = TypeError;

    fn try_from(repr: VerseKeyRepr) -> Result<Self, Self::Error> {
        VerseKey::new(&repr.book_id, repr.chapter, repr.verses)
    }
}

impl From<VerseKey> for VerseKeyRepr {
    fn from(key: VerseKey) -> Self {
        Self {
            book_id: key.book.id.to_string(),
            chapter: key.chapter,
            verses: key.verses,
        }
    }
}
