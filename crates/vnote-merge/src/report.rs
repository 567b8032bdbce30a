use serde::Serialize;
use vnote_snapshot::DocumentKind;

/// Outcome of merging one section of a document.
///
/// `imported` and `skipped` are accurate whether or not errors occurred.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    /// Set when the import stopped early on a cancellation request.
    pub cancelled: bool,
}

impl ImportReport {
    /// Returns `true` if no record failed.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records looked at so far, including failures.
    pub fn processed(&self) -> usize {
        self.imported + self.skipped + self.errors.len()
    }

    pub(crate) fn error(&mut self, key: &str, reason: impl std::fmt::Display) {
        self.errors.push(format!("{key}: {reason}"));
    }
}

/// Outcome of importing a whole document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    #[serde(serialize_with = "serialize_kind")]
    pub kind: DocumentKind,
    pub notes: Option<ImportReport>,
    pub texts: Option<ImportReport>,
}

impl ImportSummary {
    fn reports(&self) -> impl Iterator<Item = &ImportReport> {
        self.notes.iter().chain(self.texts.iter())
    }

    /// Returns `true` if every section succeeded and nothing was cancelled.
    pub fn success(&self) -> bool {
        self.reports().all(|r| r.success() && !r.cancelled)
    }

    pub fn cancelled(&self) -> bool {
        self.reports().any(|r| r.cancelled)
    }

    pub fn imported(&self) -> usize {
        self.reports().map(|r| r.imported).sum()
    }

    pub fn skipped(&self) -> usize {
        self.reports().map(|r| r.skipped).sum()
    }

    /// All errors, notes first.
    pub fn errors(&self) -> Vec<&str> {
        self.reports()
            .flat_map(|r| r.errors.iter().map(String::as_str))
            .collect()
    }
}

fn serialize_kind<S: serde::Serializer>(kind: &DocumentKind, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_tracks_errors() {
        let mut report = ImportReport::default();
        assert!(report.success());
        report.imported = 2;
        report.error("john_3_16", "boom");
        assert!(!report.success());
        assert_eq!(report.errors, vec!["john_3_16: boom"]);
        assert_eq!(report.processed(), 3);
    }

    #[test]
    fn summary_combines_sections() {
        let notes = ImportReport { imported: 2, skipped: 1, ..Default::default() };
        let texts = ImportReport {
            imported: 1,
            errors: vec!["genesis_1_kjv: bad".into()],
            ..Default::default()
        };
        let summary = ImportSummary { kind: DocumentKind::Combined, notes: Some(notes), texts: Some(texts) };
        assert_eq!(summary.imported(), 3);
        assert_eq!(summary.skipped(), 1);
        assert!(!summary.success());
        assert_eq!(summary.errors(), vec!["genesis_1_kjv: bad"]);
    }

    #[test]
    fn cancellation_is_not_success() {
        let notes = ImportReport { imported: 1, cancelled: true, ..Default::default() };
        let summary = ImportSummary { kind: DocumentKind::Notes, notes: Some(notes), texts: None };
        assert!(summary.cancelled());
        assert!(!summary.success());
    }
}
