//! Book-lookup retrieval tool.
//!
//! Facade over the book extraction chain: runs the encyclopedic and
//! web-search stages and formats the accepted candidate as tool text
//! with a provenance line.

use async_trait::async_trait;

use super::{RetrievalTool, query_schema};
use crate::extract::book::{BookCandidate, extract_book_info};
use crate::tools::search::SearchClient;
use crate::tools::wikipedia::WikipediaClient;

/// Formats an accepted candidate as the tool text the loop reads.
#[must_use]
pub fn format_candidate(query: &str, candidate: &BookCandidate) -> String {
    format!(
        "Found book information for '{query}':\n\
         Title: {}\n\
         Author: {}\n\
         First published: {}\n\
         {}",
        candidate.title,
        candidate.author,
        candidate.first_year_published,
        candidate.provenance()
    )
}

/// Retrieval tool resolving a book title to its facts.
#[derive(Debug, Clone, Default)]
pub struct BookSearchTool {
    wiki: WikipediaClient,
    search: SearchClient,
}

impl BookSearchTool {
    /// Creates the tool over existing clients.
    #[must_use]
    pub const fn new(wiki: WikipediaClient, search: SearchClient) -> Self {
        Self { wiki, search }
    }
}

#[async_trait]
impl RetrievalTool for BookSearchTool {
    fn name(&self) -> &'static str {
        "book_search"
    }

    fn description(&self) -> &'static str {
        "Search for book information using web sources. Returns the book's \
         title, author, and first publication year. Input should be the \
         book title to look up."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("The book title to look up")
    }

    async fn invoke(&self, input: &str) -> String {
        match extract_book_info(&self.wiki, &self.search, input).await {
            Ok(candidate) => format_candidate(input, &candidate),
            Err(e) => format!("No book information found for '{input}': {e}"),
        }
    }
}
