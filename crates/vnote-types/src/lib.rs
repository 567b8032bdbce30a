//! Foundation types for VerseNote.
//!
//! This crate provides the verse-key codec, the closed book catalog, and the
//! record model shared by every other VerseNote crate.
//!
//! # Key Types
//!
//! - [`VerseKey`] -- canonical (book, chapter, verse-set) identifier
//! - [`Book`] -- an entry of the closed 66-book catalog
//! - [`Timestamp`] / [`Clock`] -- millisecond timestamps and injectable clocks
//! - [`PersonalNote`], [`ResearchEntry`], [`VerseRecord`] -- the stored record model
//! - [`ChapterText`] -- a cached chapter of scripture text

pub mod book;
pub mod error;
pub mod key;
pub mod record;
pub mod temporal;
pub mod text;

pub use book::{find_book, Book, BOOKS};
pub use error::TypeError;
pub use key::{canonicalize, VerseKey, KEY_SEPARATOR, VERSE_SEPARATOR};
pub use record::{flatten_rich_text, MediaAttachment, PersonalNote, ResearchEntry, VerseRecord};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
pub use text::{chapter_key, ChapterText};
