//! Fact-extraction heuristics.
//!
//! Turns unstructured retrieval text into best-effort candidate records
//! via ordered pattern tables and a fixed fallback chain: encyclopedic
//! lookup first, web search second. Each extractor short-circuits on the
//! first qualifying candidate and reports exhaustion as a typed
//! not-found outcome rather than an error.

pub mod book;
pub mod research;

pub use book::{BookCandidate, extract_book_info};
pub use research::{ResearchCandidate, research_overview};

/// Where an accepted candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Accepted during the encyclopedic lookup stage.
    Encyclopedia,
    /// Accepted during the web-search fallback stage.
    WebSearch,
}

impl SourceKind {
    /// Human-readable label used in provenance lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Encyclopedia => "Wikipedia",
            Self::WebSearch => "Web search",
        }
    }
}
