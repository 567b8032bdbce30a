//! Research entry policy: id generation and tag normalization.

use vnote_types::{ResearchEntry, Timestamp};

/// A research entry before it has an id or timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResearchDraft {
    pub query: String,
    pub response: String,
    pub selected_text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub highlighted: Option<Vec<String>>,
}

impl ResearchDraft {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(tags.into_iter().map(|t| t.as_ref().to_string()).collect());
        self
    }

    pub fn with_selected_text(mut self, text: impl Into<String>) -> Self {
        self.selected_text = Some(text.into());
        self
    }

    /// Finish the draft. Tags are normalized; an empty tag list becomes `None`.
    pub fn into_entry(self, id: String, timestamp: Timestamp) -> ResearchEntry {
        ResearchEntry {
            id,
            query: self.query,
            response: self.response,
            selected_text: self.selected_text,
            timestamp,
            tags: self.tags.and_then(non_empty_tags),
            highlighted: self.highlighted,
        }
    }
}

pub(crate) fn non_empty_tags(tags: Vec<String>) -> Option<Vec<String>> {
    let tags = normalize_tags(tags);
    (!tags.is_empty()).then_some(tags)
}

/// Generate a fresh entry id.
///
/// UUID v7: a millisecond timestamp prefix plus 74 random bits, unique across
/// the lifetime of the store rather than just within one record.
pub fn new_entry_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trim each tag and drop empties and repeats. Case is preserved and the
/// first occurrence wins.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
