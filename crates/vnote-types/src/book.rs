//! The closed catalog of book identifiers.
//!
//! Book ids are lower-case ASCII with no separators (`1corinthians`,
//! `songofsolomon`), so they can be embedded in a [`VerseKey`](crate::VerseKey)
//! string without escaping. The catalog order is the canonical Protestant
//! ordering and is used when rendering exports grouped by book.

/// A single book of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Book {
    /// Stable identifier used in keys and documents.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Zero-based position in canonical order.
    pub order: usize,
}

const fn book(id: &'static str, name: &'static str, order: usize) -> Book {
    Book { id, name, order }
}

/// Every book known to the catalog, in canonical order.
pub const BOOKS: [Book; 66] = [
    book("genesis", "Genesis", 0),
    book("exodus", "Exodus", 1),
    book("leviticus", "Leviticus", 2),
    book("numbers", "Numbers", 3),
    book("deuteronomy", "Deuteronomy", 4),
    book("joshua", "Joshua", 5),
    book("judges", "Judges", 6),
    book("ruth", "Ruth", 7),
    book("1samuel", "1 Samuel", 8),
    book("2samuel", "2 Samuel", 9),
    book("1kings", "1 Kings", 10),
    book("2kings", "2 Kings", 11),
    book("1chronicles", "1 Chronicles", 12),
    book("2chronicles", "2 Chronicles", 13),
    book("ezra", "Ezra", 14),
    book("nehemiah", "Nehemiah", 15),
    book("esther", "Esther", 16),
    book("job", "Job", 17),
    book("psalms", "Psalms", 18),
    book("proverbs", "Proverbs", 19),
    book("ecclesiastes", "Ecclesiastes", 20),
    book("songofsolomon", "Song of Solomon", 21),
    book("isaiah", "Isaiah", 22),
    book("jeremiah", "Jeremiah", 23),
    book("lamentations", "Lamentations", 24),
    book("ezekiel", "Ezekiel", 25),
    book("daniel", "Daniel", 26),
    book("hosea", "Hosea", 27),
    book("joel", "Joel", 28),
    book("amos", "Amos", 29),
    book("obadiah", "Obadiah", 30),
    book("jonah", "Jonah", 31),
    book("micah", "Micah", 32),
    book("nahum", "Nahum", 33),
    book("habakkuk", "Habakkuk", 34),
    book("zephaniah", "Zephaniah", 35),
    book("haggai", "Haggai", 36),
    book("zechariah", "Zechariah", 37),
    book("malachi", "Malachi", 38),
    book("matthew", "Matthew", 39),
    book("mark", "Mark", 40),
    book("luke", "Luke", 41),
    book("john", "John", 42),
    book("acts", "Acts", 43),
    book("romans", "Romans", 44),
    book("1corinthians", "1 Corinthians", 45),
    book("2corinthians", "2 Corinthians", 46),
    book("galatians", "Galatians", 47),
    book("ephesians", "Ephesians", 48),
    book("philippians", "Philippians", 49),
    book("colossians", "Colossians", 50),
    book("1thessalonians", "1 Thessalonians", 51),
    book("2thessalonians", "2 Thessalonians", 52),
    book("1timothy", "1 Timothy", 53),
    book("2timothy", "2 Timothy", 54),
    book("titus", "Titus", 55),
    book("philemon", "Philemon", 56),
    book("hebrews", "Hebrews", 57),
    book("james", "James", 58),
    book("1peter", "1 Peter", 59),
    book("2peter", "2 Peter", 60),
    book("1john", "1 John", 61),
    book("2john", "2 John", 62),
    book("3john", "3 John", 63),
    book("jude", "Jude", 64),
    book("revelation", "Revelation", 65),
];

/// Look up a book by id. Matching is exact: ids are already lower-case.
pub fn find_book(id: &str) -> Option<&'static Book> {
    BOOKS.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_matches_position() {
        for (i, b) in BOOKS.iter().enumerate() {
            assert_eq!(b.order, i, "{} out of place", b.id);
        }
    }

    #[test]
    fn ids_are_unique_and_separator_free() {
        let mut ids: Vec<&str> = BOOKS.iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 66);
        for id in ids {
            assert!(!id.contains('_') && !id.contains(','));
            assert_eq!(id, id.to_ascii_lowercase());
        }
    }

    #[test]
    fn find_known_and_unknown() {
        assert_eq!(find_book("john").unwrap().name, "John");
        assert_eq!(find_book("1john").unwrap().order, 61);
        assert!(find_book("John").is_none());
        assert!(find_book("enoch").is_none());
    }
}
