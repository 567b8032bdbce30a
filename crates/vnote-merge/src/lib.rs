//! Snapshot reconciliation for VerseNote.
//!
//! A [`Reconciler`] folds an incoming snapshot into the live stores under one
//! of four [`MergeStrategy`] values:
//!
//! | existing record | `replace` | `merge_newer` | `merge_combine` | `skip_existing` |
//! |---|---|---|---|---|
//! | absent | import | import | import | import |
//! | present | overwrite | import if the incoming note is newer | combine | skip |
//!
//! Documents are parsed and validated in full before anything is written, so
//! a rejected document leaves the stores untouched. Within an accepted
//! document each record is isolated: failures land in
//! [`ImportReport::errors`] and the merge continues.

pub mod cancel;
pub mod error;
pub mod export;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod strategy;

pub use cancel::CancellationToken;
pub use error::{MergeError, MergeResult};
pub use export::{export_backup, export_notes, export_texts};
pub use reconcile::Reconciler;
pub use report::{ImportReport, ImportSummary};
pub use resolve::{combine, resolve_chapter, resolve_record, Resolution};
pub use strategy::{MergeStrategy, UnknownStrategy};
