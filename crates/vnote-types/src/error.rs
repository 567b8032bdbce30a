use thiserror::Error;

/// Errors produced when constructing or validating keys and records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown book id: {0}")]
    UnknownBook(String),

    #[error("invalid chapter {0}: chapters start at 1")]
    InvalidChapter(u32),

    #[error("invalid verse {0}: verses start at 1")]
    InvalidVerse(u32),

    #[error("verse set must not be empty")]
    EmptyVerses,

    #[error("malformed key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("note updated at {updated_at} before it was created at {created_at}")]
    NoteTimestamps { created_at: u64, updated_at: u64 },

    #[error("invalid translation {0:?}")]
    InvalidTranslation(String),
}
