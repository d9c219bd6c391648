//! Web search via the DuckDuckGo HTML endpoint.
//!
//! No API key required: the tool fetches the HTML results page and
//! extracts ranked title/snippet/source triples with CSS selectors.
//! Parsing is split from fetching so it runs against canned HTML in
//! tests.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use super::{RetrievalTool, query_schema};
use crate::error::Error;

/// DuckDuckGo HTML results endpoint.
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
/// Maximum ranked results returned per query.
const MAX_RESULTS: usize = 5;
/// Request timeout for search calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Browser user-agent; the HTML endpoint rejects bare clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result snippet/description.
    pub snippet: String,
    /// Source URL (as displayed by the results page).
    pub url: String,
}

/// Low-level web-search client.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    search_url: String,
    max_results: usize,
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchClient {
    /// Creates a client against the public DuckDuckGo HTML endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            search_url: SEARCH_URL.to_string(),
            max_results: MAX_RESULTS,
        }
    }

    /// Overrides the endpoint (tests, proxies).
    #[must_use]
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Issues a keyword query and returns up to 5 ranked hits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] on transport failures; an empty hit list is
    /// a valid result, not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, Error> {
        debug!(query, "web search");
        let url = format!("{}?q={}", self.search_url, urlencoding::encode(query));
        let response = self.client.get(&url).send().await.map_err(|e| Error::Tool {
            name: "web_search".to_string(),
            message: format!("request failed: {e}"),
        })?;
        let html = response.text().await.map_err(|e| Error::Tool {
            name: "web_search".to_string(),
            message: format!("failed to read response body: {e}"),
        })?;
        Ok(parse_results(&html, self.max_results))
    }
}

/// Extracts ranked hits from a DuckDuckGo HTML results page.
///
/// The results page wraps each hit in `div.result`, with the title in
/// `a.result__a`, the snippet in `a.result__snippet`, and the displayed
/// source in `a.result__url`.
#[must_use]
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    let Ok(result_sel) = Selector::parse("div.result") else {
        return Vec::new();
    };
    let Ok(title_sel) = Selector::parse("a.result__a") else {
        return Vec::new();
    };
    let Ok(snippet_sel) = Selector::parse("a.result__snippet") else {
        return Vec::new();
    };
    let Ok(url_sel) = Selector::parse("a.result__url") else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .take(max_results)
        .map(|result| {
            let text_of = |sel: &Selector, fallback: &str| {
                result.select(sel).next().map_or_else(
                    || fallback.to_string(),
                    |el| el.text().collect::<String>().trim().to_string(),
                )
            };
            SearchHit {
                title: text_of(&title_sel, "No title"),
                snippet: text_of(&snippet_sel, "No description"),
                url: text_of(&url_sel, "No URL"),
            }
        })
        .collect()
}

/// Formats hits as the numbered triple list the reasoning loop reads.
#[must_use]
pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No search results found for query: {query}");
    }
    let formatted: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. **{}**\n   {}\n   Source: {}\n",
                i + 1,
                hit.title,
                hit.snippet,
                hit.url
            )
        })
        .collect();
    format!(
        "Search results for '{query}':\n\n{}",
        formatted.join("\n")
    )
}

/// Retrieval-tool facade over [`SearchClient`].
#[derive(Debug, Clone, Default)]
pub struct WebSearchTool {
    client: SearchClient,
}

impl WebSearchTool {
    /// Creates the tool over an existing client.
    #[must_use]
    pub const fn new(client: SearchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RetrievalTool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information using DuckDuckGo. Use this \
         for recent news, current events, and general web information."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("The search query to look up")
    }

    async fn invoke(&self, input: &str) -> String {
        match self.client.search(input).await {
            Ok(hits) => format_results(input, &hits),
            Err(e) => format!("Error searching the web: {e}"),
        }
    }
}
