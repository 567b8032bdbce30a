//! Verse-keyed record storage for VerseNote.
//!
//! The [`VerseRecordStore`] maps canonical verse keys to [`VerseRecord`]s on
//! top of any [`KvStore`] substrate. It keeps the store sparse: a record that
//! ends up with neither a note nor research is deleted rather than written.
//!
//! # Substrates
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileKvStore`] -- one JSON file per key in a directory
//!
//! # Design Rules
//!
//! 1. Every key is produced by [`vnote_types::canonicalize`] / [`VerseKey`].
//! 2. Read-modify-write on one key runs under that key's lock.
//! 3. Absence is `Ok(None)` / no-op, never an error.
//! 4. Substrate failures are returned to the caller, never only logged.
//!
//! [`VerseRecord`]: vnote_types::VerseRecord
//! [`VerseKey`]: vnote_types::VerseKey

pub mod error;
pub mod file;
pub mod locks;
pub mod memory;
pub mod records;
pub mod research;
pub mod texts;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileKvStore;
pub use locks::KeyLocks;
pub use memory::InMemoryKvStore;
pub use records::{RecordChange, StoreStats, VerseRecordStore};
pub use research::{new_entry_id, normalize_tags, ResearchDraft};
pub use texts::ChapterTextStore;
pub use traits::KvStore;
