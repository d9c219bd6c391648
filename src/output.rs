//! Structured-output parsing and row serialization.
//!
//! Final answers from the reasoning loop arrive as free text that should
//! contain one JSON object. The parser recovers that object (tolerating
//! fenced code blocks and surrounding prose), validates it against the
//! exact per-mode field set, and never retries or mutates the raw text:
//! validation failure is a terminal, per-query [`Error::Parse`].
//!
//! Row serialization fixes the persistence wire format: book rows are
//! `[search_query, title, author, first_year_published]`, research rows
//! `[topic, summary, sources, tools_used]` with list fields joined by
//! `;`. Records round-trip through their row form losslessly.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Separator for list fields in the row representation.
pub const LIST_SEPARATOR: &str = ";";

/// Validated record for one resolved book query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookRecord {
    /// Original query line.
    pub search_query: String,
    /// Resolved title.
    pub title: String,
    /// Resolved author.
    pub author: String,
    /// First publication year, as text ("Unknown Year" allowed).
    pub first_year_published: String,
}

/// Validated record for one resolved research topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResearchRecord {
    /// Original topic text.
    pub topic: String,
    /// Summary of findings.
    pub summary: String,
    /// Source URLs in consultation order.
    pub sources: Vec<String>,
    /// Tool names in invocation order.
    pub tools_used: Vec<String>,
}

impl BookRecord {
    /// Row form in the fixed persistence column order.
    #[must_use]
    pub fn to_row(&self) -> [String; 4] {
        [
            self.search_query.clone(),
            self.title.clone(),
            self.author.clone(),
            self.first_year_published.clone(),
        ]
    }

    /// Reconstructs a record from its row form.
    pub fn from_row(row: &[String]) -> Result<Self, Error> {
        let [search_query, title, author, first_year_published] = row else {
            return Err(Error::parse(
                format!("expected 4 book columns, got {}", row.len()),
                &row.join(","),
            ));
        };
        Ok(Self {
            search_query: search_query.clone(),
            title: title.clone(),
            author: author.clone(),
            first_year_published: first_year_published.clone(),
        })
    }
}

impl ResearchRecord {
    /// Row form with `;`-joined list fields.
    #[must_use]
    pub fn to_row(&self) -> [String; 4] {
        [
            self.topic.clone(),
            self.summary.clone(),
            join_list(&self.sources),
            join_list(&self.tools_used),
        ]
    }

    /// Reconstructs a record from its row form, re-splitting list fields.
    pub fn from_row(row: &[String]) -> Result<Self, Error> {
        let [topic, summary, sources, tools_used] = row else {
            return Err(Error::parse(
                format!("expected 4 research columns, got {}", row.len()),
                &row.join(","),
            ));
        };
        Ok(Self {
            topic: topic.clone(),
            summary: summary.clone(),
            sources: split_list(sources),
            tools_used: split_list(tools_used),
        })
    }
}

fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

fn split_list(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(LIST_SEPARATOR).map(str::to_string).collect()
}

/// Parses and validates the raw final answer as a book record.
pub fn parse_book(raw: &str) -> Result<BookRecord, Error> {
    parse_json(raw)
}

/// Parses and validates the raw final answer as a research record.
pub fn parse_research(raw: &str) -> Result<ResearchRecord, Error> {
    parse_json(raw)
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, Error> {
    let json = recover_json(raw).ok_or_else(|| Error::parse("no JSON object found", raw))?;
    serde_json::from_str(json).map_err(|e| Error::parse(e.to_string(), raw))
}

/// Recovers the JSON object embedded in free text.
///
/// Prefers a fenced code block when one is present, otherwise falls back
/// to the outermost brace span. Returns a borrowed slice of the input;
/// the raw text is never mutated.
#[must_use]
pub fn recover_json(raw: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(raw) {
        if let Some(span) = brace_span(fenced) {
            return Some(span);
        }
    }
    brace_span(raw)
}

/// Contents of the first triple-backtick fence, tolerating a language tag.
fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after_fence = &raw[start + 3..];
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Span from the first `{` to its matching last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK_JSON: &str = r#"{"search_query": "the hobbit", "title": "The Hobbit", "author": "J.R.R. Tolkien", "first_year_published": "1937"}"#;

    #[test]
    fn test_parses_bare_json() {
        match parse_book(BOOK_JSON) {
            Ok(record) => {
                assert_eq!(record.title, "The Hobbit");
                assert_eq!(record.first_year_published, "1937");
            }
            Err(e) => unreachable!("unexpected parse failure: {e}"),
        }
    }

    #[test]
    fn test_recovers_json_from_fenced_block() {
        let raw = format!("Here is the result:\n```json\n{BOOK_JSON}\n```\nDone.");
        match parse_book(&raw) {
            Ok(record) => assert_eq!(record.author, "J.R.R. Tolkien"),
            Err(e) => unreachable!("unexpected parse failure: {e}"),
        }
    }

    #[test]
    fn test_recovers_json_from_surrounding_prose() {
        let raw = format!("The answer is {BOOK_JSON} as requested.");
        match parse_book(&raw) {
            Ok(record) => assert_eq!(record.search_query, "the hobbit"),
            Err(e) => unreachable!("unexpected parse failure: {e}"),
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let raw = r#"{"search_query": "q", "title": "t", "author": "a", "first_year_published": "1990", "extra": true}"#;
        assert!(parse_book(raw).is_err());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let raw = r#"{"search_query": "q", "title": "t", "author": "a"}"#;
        assert!(matches!(parse_book(raw), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let raw = r#"{"topic": "t", "summary": "s", "sources": "not-a-list", "tools_used": []}"#;
        assert!(parse_research(raw).is_err());
    }

    #[test]
    fn test_no_json_at_all_is_parse_error() {
        match parse_book("I could not find that book.") {
            Err(Error::Parse { reason, raw }) => {
                assert!(reason.contains("no JSON object"));
                assert_eq!(raw, "I could not find that book.");
            }
            other => unreachable!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_book(BOOK_JSON);
        let second = parse_book(BOOK_JSON);
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            _ => unreachable!("both parses should succeed"),
        }
    }

    #[test]
    fn test_research_row_round_trip() {
        let record = ResearchRecord {
            topic: "quantum computing".to_string(),
            summary: "Computation using qubits.".to_string(),
            sources: vec![
                "https://en.wikipedia.org/wiki/Quantum_computing".to_string(),
                "https://example.com".to_string(),
            ],
            tools_used: vec!["wikipedia_search".to_string(), "web_search".to_string()],
        };
        let row = record.to_row();
        assert_eq!(row[2], "https://en.wikipedia.org/wiki/Quantum_computing;https://example.com");
        match ResearchRecord::from_row(&row) {
            Ok(back) => assert_eq!(back, record),
            Err(e) => unreachable!("round trip failed: {e}"),
        }
    }

    #[test]
    fn test_research_row_empty_lists() {
        let record = ResearchRecord {
            topic: "t".to_string(),
            summary: "s".to_string(),
            sources: Vec::new(),
            tools_used: Vec::new(),
        };
        match ResearchRecord::from_row(&record.to_row()) {
            Ok(back) => {
                assert!(back.sources.is_empty());
                assert!(back.tools_used.is_empty());
            }
            Err(e) => unreachable!("round trip failed: {e}"),
        }
    }

    #[test]
    fn test_book_row_round_trip() {
        let record = BookRecord {
            search_query: "dune".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            first_year_published: "1965".to_string(),
        };
        let row = record.to_row();
        assert_eq!(row[0], "dune");
        match BookRecord::from_row(&row) {
            Ok(back) => assert_eq!(back, record),
            Err(e) => unreachable!("round trip failed: {e}"),
        }
    }

    #[test]
    fn test_short_row_is_rejected() {
        let row = vec!["only".to_string(), "three".to_string(), "cols".to_string()];
        assert!(BookRecord::from_row(&row).is_err());
    }

    #[test]
    fn test_nested_braces_recovered() {
        let raw = r#"```
{"topic": "t", "summary": "uses {braces}", "sources": [], "tools_used": []}
```"#;
        match parse_research(raw) {
            Ok(record) => assert_eq!(record.summary, "uses {braces}"),
            Err(e) => unreachable!("unexpected parse failure: {e}"),
        }
    }
}
