use vnote_types::TypeError;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The substrate failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// I/O error from a file-backed substrate.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key or record failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] TypeError),

    /// A record was written under a key other than its own.
    #[error("record key {found} does not match target key {expected}")]
    KeyMismatch { expected: String, found: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
