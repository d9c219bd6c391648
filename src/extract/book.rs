//! Book-fact extraction.
//!
//! Two-stage fallback chain, short-circuiting on first success:
//!
//! 1. Encyclopedic stage: for each query variant (`"<q> book"`,
//!    `"<q> novel"`, `"<q>"`) search up to five candidate titles, fetch
//!    each article, and accept the first whose text carries a
//!    book-indicator phrase. Disambiguation and missing pages on a
//!    candidate advance the loop rather than failing it.
//! 2. Web stage: search `"<q> book author publication year"` and accept
//!    the first of up to five results whose title+snippet carries a
//!    book keyword.
//!
//! Field extraction runs the ordered pattern tables below against the
//! accepted text. The table order is the authoritative precedence.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::SourceKind;
use crate::error::Error;
use crate::tools::search::{SearchClient, SearchHit};
use crate::tools::wikipedia::{PageLookup, WikiPage, WikipediaClient};

/// Candidate titles examined per encyclopedic query variant.
const WIKI_CANDIDATES: usize = 5;
/// Web results examined in the fallback stage.
const WEB_CANDIDATES: usize = 5;
/// Earliest publication year considered plausible.
const MIN_PLAUSIBLE_YEAR: u16 = 1000;
/// Latest publication year considered plausible.
const MAX_PLAUSIBLE_YEAR: u16 = 2024;
/// Pattern matches at or below this length are treated as no match.
const MAX_IMPLAUSIBLE_TITLE_LEN: usize = 3;

/// Sentinel for an author no pattern matched.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Sentinel for a year no in-range match survived.
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// Phrases marking an article as being about a book.
const BOOK_INDICATORS: &[&str] = &[
    "is a novel",
    "is a book",
    "novel by",
    "first published",
    "was published",
    "isbn",
];

/// Keywords marking a web result as book-related.
const WEB_KEYWORDS: &[&str] = &["book", "novel", "author", "published", "publication"];

/// Author patterns, tried in order; first match wins.
static AUTHOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)written by ([A-Z][\w.'-]*(?: [A-Z][\w.'-]*)+)",
        r"(?i)novel by ([A-Z][\w.'-]*(?: [A-Z][\w.'-]*)+)",
        r"(?i)book by ([A-Z][\w.'-]*(?: [A-Z][\w.'-]*)+)",
        r"\bby ([A-Z][\w.'-]* [A-Z][\w.'-]*)",
        r"([A-Z][\w.'-]*(?: [A-Z][\w.'-]*)+) is the author",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Year patterns, tried in order; matches are pooled across the table.
static YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)first published in (\d{4})",
        r"(?i)originally published in (\d{4})",
        r"(?i)published in (\d{4})",
        r"(?i)published (\d{4})",
        r"\b(\d{4})\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Title patterns for the web stage; quoted substrings take precedence.
static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""([^"]+)""#,
        r"\u{201c}([^\u{201d}]+)\u{201d}",
        r"(?i)book titled ([A-Z][^,.\n]+)",
        r"(?i)novel titled ([A-Z][^,.\n]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Best-effort structured guess for one book query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCandidate {
    /// Original query line, carried verbatim.
    pub search_query: String,
    /// Accepted title, or the query text when no pattern matched.
    pub title: String,
    /// Extracted author, or [`UNKNOWN_AUTHOR`].
    pub author: String,
    /// Extracted year, or [`UNKNOWN_YEAR`].
    pub first_year_published: String,
    /// Stage that produced the candidate.
    pub source_kind: SourceKind,
    /// URL of the accepted article or search result.
    pub source_url: String,
}

impl BookCandidate {
    /// Provenance line appended to the human-readable tool text.
    #[must_use]
    pub fn provenance(&self) -> String {
        format!("Source: {} ({})", self.source_kind.label(), self.source_url)
    }
}

/// Resolves a book query through both fallback stages.
///
/// Returns [`Error::NotFound`] when every stage is exhausted without a
/// qualifying candidate.
pub async fn extract_book_info(
    wiki: &WikipediaClient,
    search: &SearchClient,
    query: &str,
) -> Result<BookCandidate, Error> {
    if let Some(candidate) = encyclopedic_stage(wiki, query).await {
        return Ok(candidate);
    }
    if let Some(candidate) = web_stage(search, query).await {
        return Ok(candidate);
    }
    Err(Error::NotFound {
        query: query.to_string(),
    })
}

/// Encyclopedic stage: query variants in order, candidates in rank order.
async fn encyclopedic_stage(wiki: &WikipediaClient, query: &str) -> Option<BookCandidate> {
    let variants = [
        format!("{query} book"),
        format!("{query} novel"),
        query.to_string(),
    ];
    for variant in &variants {
        let titles = match wiki.search_titles(variant, WIKI_CANDIDATES).await {
            Ok(titles) => titles,
            Err(e) => {
                debug!(variant, error = %e, "encyclopedic search failed");
                continue;
            }
        };
        for title in titles {
            match wiki.fetch_page(&title).await {
                Ok(PageLookup::Found(page)) if looks_like_book(&page.text) => {
                    debug!(title = %page.title, "book article accepted");
                    return Some(from_article(query, &page));
                }
                // Non-book article, disambiguation, or missing page:
                // advance to the next candidate.
                Ok(_) => {}
                Err(e) => {
                    debug!(%title, error = %e, "page fetch failed");
                }
            }
        }
    }
    None
}

/// Web stage: first keyword-qualifying result wins.
async fn web_stage(search: &SearchClient, query: &str) -> Option<BookCandidate> {
    let hits = match search.search(&format!("{query} book author publication year")).await {
        Ok(hits) => hits,
        Err(e) => {
            debug!(error = %e, "web fallback search failed");
            return None;
        }
    };
    hits.iter()
        .take(WEB_CANDIDATES)
        .find(|hit| matches_book_keywords(hit))
        .map(|hit| from_search_hit(query, hit))
}

/// Builds the candidate from an accepted encyclopedia article.
fn from_article(query: &str, page: &WikiPage) -> BookCandidate {
    BookCandidate {
        search_query: query.to_string(),
        title: page.title.clone(),
        author: extract_author(&page.text),
        first_year_published: extract_year(&page.text),
        source_kind: SourceKind::Encyclopedia,
        source_url: page.url.clone(),
    }
}

/// Builds the candidate from an accepted web result.
fn from_search_hit(query: &str, hit: &SearchHit) -> BookCandidate {
    let blob = format!("{} {}", hit.title, hit.snippet);
    BookCandidate {
        search_query: query.to_string(),
        title: extract_web_title(&blob, query),
        author: extract_author(&blob),
        first_year_published: extract_year(&blob),
        source_kind: SourceKind::WebSearch,
        source_url: hit.url.clone(),
    }
}

/// Whether article text carries any book-indicator phrase.
#[must_use]
pub fn looks_like_book(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOOK_INDICATORS.iter().any(|ind| lower.contains(ind))
}

/// Whether a web result's title+snippet carries any book keyword.
fn matches_book_keywords(hit: &SearchHit) -> bool {
    let lower = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    WEB_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// First author-pattern match, with trailing descriptive clauses cut.
#[must_use]
pub fn extract_author(text: &str) -> String {
    for pattern in AUTHOR_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1) {
                let cleaned = trim_author(m.as_str());
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
        }
    }
    UNKNOWN_AUTHOR.to_string()
}

/// Cuts an author match at the first clause boundary.
fn trim_author(raw: &str) -> String {
    let mut name = raw;
    for boundary in [",", " and ", " who ", " which ", " that "] {
        if let Some(idx) = name.find(boundary) {
            name = &name[..idx];
        }
    }
    name.trim().trim_end_matches('.').to_string()
}

/// Minimum in-range year pooled across the whole pattern table.
///
/// All matches from every pattern are collected, filtered to
/// [1000, 2024], and the smallest survivor is returned. The earliest
/// mention most often corresponds to original publication rather than
/// reprint or adaptation dates.
#[must_use]
pub fn extract_year(text: &str) -> String {
    let mut years: Vec<u16> = Vec::new();
    for pattern in YEAR_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(m) = captures.get(1) {
                if let Ok(year) = m.as_str().parse::<u16>() {
                    if (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&year) {
                        years.push(year);
                    }
                }
            }
        }
    }
    years
        .into_iter()
        .min()
        .map_or_else(|| UNKNOWN_YEAR.to_string(), |y| y.to_string())
}

/// Title for the web stage: pattern tables first, query text as fallback.
#[must_use]
pub fn extract_web_title(text: &str, query: &str) -> String {
    for pattern in TITLE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1) {
                let title = m.as_str().trim();
                if title.chars().count() > MAX_IMPLAUSIBLE_TITLE_LEN {
                    return title.to_string();
                }
            }
        }
    }
    query.to_string()
}
