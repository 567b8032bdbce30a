//! Applying incoming snapshots to the live stores.

use tracing::{debug, info, warn};
use vnote_snapshot::{Document, IncomingNotes, IncomingTexts};
use vnote_store::{ChapterTextStore, KvStore, RecordChange, VerseRecordStore};
use vnote_types::{ChapterText, VerseRecord};

use crate::cancel::CancellationToken;
use crate::error::MergeResult;
use crate::report::{ImportReport, ImportSummary};
use crate::resolve::{resolve_chapter, resolve_record, Resolution};
use crate::strategy::MergeStrategy;

/// Merges snapshot contents into a record store and a chapter-text store.
///
/// Each record is applied under its key's lock as one read-modify-write, so
/// edits racing with an import never interleave within a key. A failure on
/// one record is recorded in the report and the next record is processed.
pub struct Reconciler<'a, N: KvStore, T: KvStore> {
    records: &'a VerseRecordStore<N>,
    texts: &'a ChapterTextStore<T>,
}

impl<'a, N: KvStore, T: KvStore> Reconciler<'a, N, T> {
    pub fn new(records: &'a VerseRecordStore<N>, texts: &'a ChapterTextStore<T>) -> Self {
        Self { records, texts }
    }

    /// Merge already-parsed records.
    pub fn merge(
        &self,
        incoming: impl IntoIterator<Item = VerseRecord>,
        strategy: MergeStrategy,
    ) -> ImportReport {
        self.merge_with_cancel(incoming, strategy, &CancellationToken::new())
    }

    /// Merge already-parsed records, stopping early once `token` is cancelled.
    pub fn merge_with_cancel(
        &self,
        incoming: impl IntoIterator<Item = VerseRecord>,
        strategy: MergeStrategy,
        token: &CancellationToken,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for record in incoming {
            if token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.merge_record(record, strategy, &mut report);
        }
        log_report("notes", strategy, &report);
        report
    }

    /// Merge the notes section of a parsed document. Items that failed to
    /// parse are reported as errors under their map key.
    pub fn merge_notes(
        &self,
        notes: IncomingNotes,
        strategy: MergeStrategy,
        token: &CancellationToken,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for item in notes.records {
            if token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match item.record {
                Ok(record) => self.merge_record(record, strategy, &mut report),
                Err(reason) => {
                    warn!(key = %item.key, %reason, "skipping unreadable record");
                    report.error(&item.key, reason);
                }
            }
        }
        log_report("notes", strategy, &report);
        report
    }

    /// Merge the Bible-text section of a parsed document.
    pub fn merge_texts(
        &self,
        texts: IncomingTexts,
        strategy: MergeStrategy,
        token: &CancellationToken,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for item in texts.chapters {
            if token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match item.chapter {
                Ok(chapter) => self.merge_chapter(chapter, strategy, &mut report),
                Err(reason) => {
                    warn!(label = %item.label, %reason, "skipping unreadable chapter");
                    report.error(&item.label, reason);
                }
            }
        }
        log_report("texts", strategy, &report);
        report
    }

    /// Detect the kind of a raw JSON document and merge every section it has.
    ///
    /// A document that fails detection is rejected before any write.
    pub fn import_document(
        &self,
        raw: &str,
        strategy: MergeStrategy,
        token: &CancellationToken,
    ) -> MergeResult<ImportSummary> {
        let document = Document::parse(raw)?;
        Ok(self.import(document, strategy, token))
    }

    /// Merge every section of a parsed document.
    pub fn import(&self, document: Document, strategy: MergeStrategy, token: &CancellationToken) -> ImportSummary {
        let kind = document.kind();
        info!(%kind, %strategy, "importing document");
        let (notes, texts) = match document {
            Document::Combined { notes, texts, .. } => (Some(notes), Some(texts)),
            Document::Notes(notes) => (Some(notes), None),
            Document::Texts(texts) => (None, Some(texts)),
        };
        ImportSummary {
            kind,
            notes: notes.map(|n| self.merge_notes(n, strategy, token)),
            texts: texts.map(|t| self.merge_texts(t, strategy, token)),
        }
    }

    fn merge_record(&self, mut incoming: VerseRecord, strategy: MergeStrategy, report: &mut ImportReport) {
        let key = incoming.key.clone();
        let dropped = incoming.dedup_research();
        if dropped > 0 {
            debug!(key = %key, dropped, "dropped repeated research ids");
        }
        if incoming.is_empty() {
            debug!(key = %key, "incoming record is empty, skipped");
            report.skipped += 1;
            return;
        }

        let outcome = self.records.update(&key, |existing| {
            match resolve_record(strategy, existing.as_ref(), incoming) {
                Resolution::Import(record) if existing.as_ref() == Some(&record) => (RecordChange::Keep, true),
                Resolution::Import(record) => (RecordChange::Put(record), true),
                Resolution::Skip => (RecordChange::Keep, false),
            }
        });

        match outcome {
            Ok(true) => {
                debug!(key = %key, "record imported");
                report.imported += 1;
            }
            Ok(false) => {
                debug!(key = %key, "record skipped");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "record import failed");
                report.error(&key.to_string(), e);
            }
        }
    }

    fn merge_chapter(&self, incoming: ChapterText, strategy: MergeStrategy, report: &mut ImportReport) {
        let label = incoming.storage_key();
        let existing = match self
            .texts
            .get(&incoming.book_id, incoming.chapter, &incoming.translation)
        {
            Ok(existing) => existing,
            Err(e) => {
                warn!(key = %label, error = %e, "chapter lookup failed");
                report.error(&label, e);
                return;
            }
        };

        match resolve_chapter(strategy, existing.as_ref(), incoming) {
            Resolution::Import(chapter) => match self.texts.put(&chapter) {
                Ok(()) => report.imported += 1,
                Err(e) => {
                    warn!(key = %label, error = %e, "chapter import failed");
                    report.error(&label, e);
                }
            },
            Resolution::Skip => report.skipped += 1,
        }
    }
}

fn log_report(section: &str, strategy: MergeStrategy, report: &ImportReport) {
    info!(
        section,
        %strategy,
        imported = report.imported,
        skipped = report.skipped,
        errors = report.errors.len(),
        cancelled = report.cancelled,
        "merge finished"
    );
}
