//! The stored record model.
//!
//! One [`VerseRecord`] exists per [`VerseKey`]. It carries an optional
//! [`PersonalNote`] and an ordered list of [`ResearchEntry`] values. The wire
//! shape is camelCase JSON with the key flattened into the record:
//!
//! ```json
//! {
//!   "bookId": "john", "chapter": 3, "verses": [16],
//!   "personalNote": { "text": "...", "createdAt": 1, "updatedAt": 2 },
//!   "aiResearch": [ { "id": "...", "query": "...", "response": "...", "timestamp": 3 } ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::key::VerseKey;
use crate::temporal::Timestamp;

/// A media attachment on a note. Only `id` and `type` are interpreted; every
/// other field is carried verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// A personal note attached to a verse key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalNote {
    /// Rich-text payload, stored verbatim. Either an HTML string or an
    /// editor document tree.
    pub text: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaAttachment>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PersonalNote {
    /// A note whose creation and update time are both `at`.
    pub fn new(text: impl Into<Value>, at: Timestamp) -> Self {
        Self {
            text: text.into(),
            drawing: None,
            media: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// A note may not be updated before it was created.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.updated_at < self.created_at {
            return Err(TypeError::NoteTimestamps {
                created_at: self.created_at.as_millis(),
                updated_at: self.updated_at.as_millis(),
            });
        }
        Ok(())
    }

    /// The note text flattened to plain text.
    pub fn plain_text(&self) -> String {
        flatten_rich_text(&self.text)
    }
}

/// One AI-assisted research exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchEntry {
    pub id: String,
    pub query: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<Vec<String>>,
}

/// Everything stored for one verse key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRecord {
    #[serde(flatten)]
    pub key: VerseKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_note: Option<PersonalNote>,
    #[serde(default)]
    pub ai_research: Vec<ResearchEntry>,
}

impl VerseRecord {
    /// An empty record for `key`. Never persisted as-is.
    pub fn new(key: VerseKey) -> Self {
        Self {
            key,
            personal_note: None,
            ai_research: Vec::new(),
        }
    }

    /// A record holds nothing when it has no note and no research.
    pub fn is_empty(&self) -> bool {
        self.personal_note.is_none() && self.ai_research.is_empty()
    }

    /// Last-write time of the note, or [`Timestamp::ZERO`] without one.
    pub fn note_updated_at(&self) -> Timestamp {
        self.personal_note
            .as_ref()
            .map(|n| n.updated_at)
            .unwrap_or(Timestamp::ZERO)
    }

    pub fn research(&self, id: &str) -> Option<&ResearchEntry> {
        self.ai_research.iter().find(|e| e.id == id)
    }

    pub fn research_mut(&mut self, id: &str) -> Option<&mut ResearchEntry> {
        self.ai_research.iter_mut().find(|e| e.id == id)
    }

    pub fn has_research(&self, id: &str) -> bool {
        self.research(id).is_some()
    }

    /// Drop research entries whose id already appeared earlier in the list.
    /// Returns the number of entries removed.
    pub fn dedup_research(&mut self) -> usize {
        let before = self.ai_research.len();
        let mut seen = HashSet::new();
        self.ai_research.retain(|e| seen.insert(e.id.clone()));
        before - self.ai_research.len()
    }
}

/// Flatten a rich-text payload to plain text.
///
/// Strings are treated as HTML: tags are dropped, block-closing tags become
/// line breaks and the common entities are decoded. Document trees are walked
/// collecting `text` and `insert` leaves, with a line break after each block
/// node that has children.
pub fn flatten_rich_text(value: &Value) -> String {
    let raw = match value {
        Value::String(html) => strip_html(html),
        Value::Null => String::new(),
        other => {
            let mut out = String::new();
            collect_text(other, &mut out);
            out
        }
    };
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for leaf in ["text", "insert"] {
                if let Some(Value::String(s)) = map.get(leaf) {
                    out.push_str(s);
                }
            }
            let mut is_block = false;
            for (k, child) in map {
                if k == "text" || k == "insert" {
                    continue;
                }
                if child.is_array() || child.is_object() {
                    is_block |= child.is_array();
                    collect_text(child, out);
                }
            }
            if is_block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closing = tag.starts_with('/');
                let breaks = name == "br"
                    || (closing && matches!(name.as_str(), "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "blockquote"));
                if breaks {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
