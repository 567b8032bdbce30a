//! Human-oriented renderings of a record set.
//!
//! Both are export-only projections: records are grouped by book in
//! canonical order, then ordered by chapter and lowest verse.

use std::fmt;

use serde_json::Value;
use vnote_types::{Book, ResearchEntry, VerseRecord};

const HTML_HEAD: &str =
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Verse notes</title>\n</head>\n<body>\n";
const HTML_TAIL: &str = "</body>\n</html>\n";

fn grouped(records: &[VerseRecord]) -> Vec<(&'static Book, Vec<&VerseRecord>)> {
    let mut sorted: Vec<&VerseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<(&'static Book, Vec<&VerseRecord>)> = Vec::new();
    for record in sorted {
        let book = record.key.book();
        match groups.last_mut() {
            Some((current, items)) if current.id == book.id => items.push(record),
            _ => groups.push((book, vec![record])),
        }
    }
    groups
}

/// Plain structured text: one section per record, notes flattened, research
/// listed as question/answer pairs.
pub fn render_text(records: &[VerseRecord]) -> String {
    TextRendering(records).to_string()
}

/// A standalone HTML document. Note markup is kept as written; research
/// content and flattened notes are escaped.
pub fn render_html(records: &[VerseRecord]) -> String {
    HtmlRendering(records).to_string()
}

/// Streams the plain text rendering into any formatter.
pub struct TextRendering<'a>(pub &'a [VerseRecord]);

impl fmt::Display for TextRendering<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (book, items) in grouped(self.0) {
            writeln!(f, "{}", book.name.to_uppercase())?;
            writeln!(f, "{}", "=".repeat(book.name.len()))?;
            for record in items {
                writeln!(f)?;
                writeln!(f, "## {}", record.key.reference())?;
                if let Some(note) = &record.personal_note {
                    let text = note.plain_text();
                    if !text.is_empty() {
                        writeln!(f)?;
                        writeln!(f, "Note:")?;
                        for line in text.lines() {
                            writeln!(f, "  {line}")?;
                        }
                    }
                }
                for entry in &record.ai_research {
                    writeln!(f)?;
                    write_text_entry(f, entry)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_text_entry(f: &mut fmt::Formatter<'_>, entry: &ResearchEntry) -> fmt::Result {
    if let Some(selected) = entry.selected_text.as_deref().filter(|s| !s.is_empty()) {
        writeln!(f, "Selected: \"{selected}\"")?;
    }
    writeln!(f, "Q: {}", entry.query)?;
    writeln!(f, "A: {}", entry.response)?;
    if let Some(tags) = entry.tags.as_ref().filter(|t| !t.is_empty()) {
        writeln!(f, "Tags: {}", tags.join(", "))?;
    }
    Ok(())
}

/// Streams the HTML document into any formatter.
pub struct HtmlRendering<'a>(pub &'a [VerseRecord]);

impl fmt::Display for HtmlRendering<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HTML_HEAD)?;
        for (book, items) in grouped(self.0) {
            writeln!(f, "<section class=\"book\" id=\"{}\">", book.id)?;
            writeln!(f, "<h1>{}</h1>", escape_html(book.name))?;
            for record in items {
                writeln!(f, "<article class=\"verse\" id=\"{}\">", record.key)?;
                writeln!(f, "<h2>{}</h2>", escape_html(&record.key.reference()))?;
                if let Some(note) = &record.personal_note {
                    writeln!(f, "<div class=\"note\">{}</div>", note_markup(&note.text))?;
                }
                if !record.ai_research.is_empty() {
                    writeln!(f, "<div class=\"research\">")?;
                    for entry in &record.ai_research {
                        write_html_entry(f, entry)?;
                    }
                    writeln!(f, "</div>")?;
                }
                writeln!(f, "</article>")?;
            }
            writeln!(f, "</section>")?;
        }
        f.write_str(HTML_TAIL)
    }
}

fn note_markup(text: &Value) -> String {
    match text {
        Value::String(markup) => markup.clone(),
        other => vnote_types::flatten_rich_text(other)
            .lines()
            .map(|line| format!("<p>{}</p>", escape_html(line)))
            .collect(),
    }
}

fn write_html_entry(f: &mut fmt::Formatter<'_>, entry: &ResearchEntry) -> fmt::Result {
    writeln!(f, "<div class=\"entry\" id=\"{}\">", escape_html(&entry.id))?;
    if let Some(selected) = entry.selected_text.as_deref().filter(|s| !s.is_empty()) {
        writeln!(f, "<blockquote>{}</blockquote>", escape_html(selected))?;
    }
    writeln!(f, "<p class=\"query\"><strong>Q:</strong> {}</p>", escape_html(&entry.query))?;
    writeln!(f, "<p class=\"response\"><strong>A:</strong> {}</p>", escape_html(&entry.response))?;
    if let Some(tags) = entry.tags.as_ref().filter(|t| !t.is_empty()) {
        let tags: Vec<String> = tags
            .iter()
            .map(|t| format!("<span class=\"tag\">{}</span>", escape_html(t)))
            .collect();
        writeln!(f, "<p class=\"tags\">{}</p>", tags.join(" "))?;
    }
    writeln!(f, "</div>")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vnote_types::{PersonalNote, Timestamp, VerseKey};

    fn record(book: &str, chapter: u32, verses: &[u32]) -> VerseRecord {
        VerseRecord::new(VerseKey::new(book, chapter, verses.iter().copied()).unwrap())
    }

    fn entry(query: &str, response: &str, tags: Option<Vec<&str>>) -> ResearchEntry {
        ResearchEntry {
            id: "r1".into(),
            query: query.into(),
            response: response.into(),
            selected_text: None,
            timestamp: Timestamp(1),
            tags: tags.map(|t| t.into_iter().map(String::from).collect()),
            highlighted: None,
        }
    }

    fn sample() -> Vec<VerseRecord> {
        let mut john = record("john", 3, &[16]);
        john.personal_note = Some(PersonalNote::new("<p>God so <b>loved</b></p>", Timestamp(1)));
        john.ai_research = vec![entry("What is <agape>?", "Love & more", Some(vec!["love", "greek"]))];

        let mut genesis_late = record("genesis", 2, &[4]);
        genesis_late.personal_note = Some(PersonalNote::new(json!([{"insert": "second"}]), Timestamp(1)));
        let mut genesis_early = record("genesis", 1, &[3, 1]);
        genesis_early.personal_note = Some(PersonalNote::new("first", Timestamp(1)));
        let mut genesis_mid = record("genesis", 1, &[2]);
        genesis_mid.personal_note = Some(PersonalNote::new("middle", Timestamp(1)));

        vec![john, genesis_late, genesis_mid, genesis_early]
    }

    #[test]
    fn text_groups_books_in_canonical_order() {
        let text = render_text(&sample());
        let genesis = text.find("GENESIS").unwrap();
        let john = text.find("JOHN").unwrap();
        assert!(genesis < john);

        let first = text.find("## Genesis 1:1,3").unwrap();
        let mid = text.find("## Genesis 1:2").unwrap();
        let late = text.find("## Genesis 2:4").unwrap();
        assert!(first < mid && mid < late);
    }

    #[test]
    fn text_flattens_notes_and_lists_research() {
        let text = render_text(&sample());
        assert!(text.contains("  God so loved"));
        assert!(!text.contains("<b>"));
        assert!(text.contains("  second"));
        assert!(text.contains("Q: What is <agape>?"));
        assert!(text.contains("A: Love & more"));
        assert!(text.contains("Tags: love, greek"));
    }

    #[test]
    fn html_keeps_note_markup_and_escapes_research() {
        let html = render_html(&sample());
        assert!(html.contains("<div class=\"note\"><p>God so <b>loved</b></p></div>"));
        assert!(html.contains("<div class=\"note\"><p>second</p></div>"));
        assert!(html.contains("What is &lt;agape&gt;?"));
        assert!(html.contains("Love &amp; more"));
        assert!(!html.contains("<agape>"));
        assert!(html.find("id=\"genesis\"").unwrap() < html.find("id=\"john\"").unwrap());
    }

    #[test]
    fn empty_input_renders_empty_sections() {
        assert_eq!(render_text(&[]), "");
        let html = render_html(&[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<section"));
    }

    #[test]
    fn renderings_stream_into_any_writer() {
        use std::fmt::Write as _;

        let records = sample();
        let mut out = String::from("header\n");
        write!(out, "{}", TextRendering(&records)).unwrap();
        assert_eq!(out, format!("header\n{}", render_text(&records)));

        let mut buf = Vec::new();
        std::io::Write::write_fmt(&mut buf, format_args!("{}", HtmlRendering(&records))).unwrap();
        let html = String::from_utf8(buf).unwrap();
        assert_eq!(html, render_html(&records));
        assert!(html.starts_with(HTML_HEAD) && html.ends_with(HTML_TAIL));
    }

    #[test]
    fn selected_text_is_quoted_in_both_renderings() {
        let mut r = record("john", 1, &[1]);
        let mut e = entry("q", "a", None);
        e.selected_text = Some("In the <beginning>".into());
        r.ai_research = vec![e];
        let records = vec![r];
        assert!(render_text(&records).contains("Selected: \"In the <beginning>\""));
        assert!(render_html(&records).contains("<blockquote>In the &lt;beginning&gt;</blockquote>"));
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
