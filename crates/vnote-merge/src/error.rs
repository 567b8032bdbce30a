use thiserror::Error;
use vnote_snapshot::SnapshotError;
use vnote_store::StoreError;

/// Failures that abort a whole import or export.
///
/// Per-record problems during a merge never surface here; they are collected
/// in the [`ImportReport`](crate::ImportReport) instead.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The document was rejected before anything was applied.
    #[error("format error: {0}")]
    Format(#[from] SnapshotError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MergeResult<T> = Result<T, MergeError>;
