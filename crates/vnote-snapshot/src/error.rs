use thiserror::Error;

/// Document-level failures. Every variant is a format error: the document
/// as a whole is rejected and nothing from it may be applied.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The input is not valid JSON.
    #[error("unparseable document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document has no `version` field.
    #[error("document has no version")]
    MissingVersion,

    /// The `version` is not one this build understands.
    #[error("unsupported document version {0:?}")]
    UnsupportedVersion(String),

    /// The version is known but the fields do not match any document kind.
    #[error("unrecognized document shape: {0}")]
    UnrecognizedShape(String),

    /// An item inside a strictly-parsed document is invalid.
    #[error("invalid item {key}: {reason}")]
    InvalidItem { key: String, reason: String },
}

/// Result alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
