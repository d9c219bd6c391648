//! Encyclopedic lookup against the public MediaWiki API.
//!
//! Exposes both a low-level [`WikipediaClient`] used by the extraction
//! heuristics (search titles, fetch full article text) and a
//! [`RetrievalTool`] facade for the reasoning loop. Disambiguation and
//! missing-page signals are explicit [`PageLookup`] variants consumed via
//! pattern matching, never errors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{RetrievalTool, query_schema};
use crate::error::Error;

/// Default MediaWiki API endpoint.
const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
/// Article-URL prefix for provenance lines.
const ARTICLE_URL_PREFIX: &str = "https://en.wikipedia.org/wiki/";
/// Request timeout for encyclopedia calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Marker phrase MediaWiki uses on disambiguation pages.
const DISAMBIGUATION_MARKER: &str = "may refer to";
/// Sentences included in the tool's article summary.
const SUMMARY_SENTENCES: usize = 3;

/// A fetched Wikipedia article.
#[derive(Debug, Clone)]
pub struct WikiPage {
    /// Canonical article title.
    pub title: String,
    /// Full plain-text article body.
    pub text: String,
    /// Canonical article URL.
    pub url: String,
}

/// Outcome of a page fetch.
///
/// Explicit result variants replace exception-driven disambiguation
/// handling: callers pattern-match instead of catching.
#[derive(Debug, Clone)]
pub enum PageLookup {
    /// The page exists and has body text.
    Found(WikiPage),
    /// The title is a disambiguation page; options in page order.
    Ambiguous(Vec<String>),
    /// No page exists under this title.
    NotFound,
}

/// Low-level MediaWiki client.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    api_url: String,
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WikipediaClient {
    /// Creates a client against the public English Wikipedia API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Overrides the API endpoint (tests, mirrors).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Searches the encyclopedia index for up to `limit` candidate titles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] on transport or decoding failures; callers
    /// inside the heuristics treat this as "no candidates from this stage".
    pub async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>, Error> {
        debug!(query, limit, "wikipedia title search");
        let url = format!(
            "{}?action=query&list=search&srsearch={}&srlimit={limit}&format=json",
            self.api_url,
            urlencoding::encode(query)
        );
        let value = self.get_json(&url).await?;
        Ok(parse_search_titles(&value))
    }

    /// Fetches one article's full plain text by title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] only on transport or decoding failures;
    /// missing pages and disambiguation pages are `Ok` variants.
    pub async fn fetch_page(&self, title: &str) -> Result<PageLookup, Error> {
        debug!(title, "wikipedia page fetch");
        let url = format!(
            "{}?action=query&prop=extracts&explaintext=1&redirects=1&titles={}&format=json",
            self.api_url,
            urlencoding::encode(title)
        );
        let value = self.get_json(&url).await?;
        Ok(classify_page(&value))
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, Error> {
        let response = self.client.get(url).send().await.map_err(|e| Error::Tool {
            name: "wikipedia_search".to_string(),
            message: format!("request failed: {e}"),
        })?;
        response.json().await.map_err(|e| Error::Tool {
            name: "wikipedia_search".to_string(),
            message: format!("invalid API response: {e}"),
        })
    }
}

/// Extracts candidate titles from a `list=search` API response.
#[must_use]
pub fn parse_search_titles(value: &serde_json::Value) -> Vec<String> {
    value["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Classifies a `prop=extracts` API response into a [`PageLookup`].
#[must_use]
pub fn classify_page(value: &serde_json::Value) -> PageLookup {
    let Some(pages) = value["query"]["pages"].as_object() else {
        return PageLookup::NotFound;
    };
    let Some(page) = pages.values().next() else {
        return PageLookup::NotFound;
    };

    // MediaWiki reports missing pages with a "missing" key (pageid -1).
    if page.get("missing").is_some() {
        return PageLookup::NotFound;
    }

    let title = page["title"].as_str().unwrap_or_default().to_string();
    let text = page["extract"].as_str().unwrap_or_default().to_string();
    if text.trim().is_empty() {
        return PageLookup::NotFound;
    }

    if is_disambiguation(&text) {
        return PageLookup::Ambiguous(disambiguation_options(&text));
    }

    let url = article_url(&title);
    PageLookup::Found(WikiPage { title, text, url })
}

/// Canonical article URL for a title.
#[must_use]
pub fn article_url(title: &str) -> String {
    format!(
        "{ARTICLE_URL_PREFIX}{}",
        urlencoding::encode(&title.replace(' ', "_"))
    )
}

/// Whether an extract reads like a disambiguation page.
fn is_disambiguation(text: &str) -> bool {
    text.lines()
        .take(3)
        .any(|line| line.to_lowercase().contains(DISAMBIGUATION_MARKER))
}

/// Option titles from a disambiguation extract, in page order.
fn disambiguation_options(text: &str) -> Vec<String> {
    let mut seen_marker = false;
    let mut options = Vec::new();
    for line in text.lines() {
        if !seen_marker {
            seen_marker = line.to_lowercase().contains(DISAMBIGUATION_MARKER);
            continue;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with("==") {
            continue;
        }
        // Option lines lead with the target title, often followed by a
        // comma-separated gloss.
        let option = line.split(',').next().unwrap_or(line).trim();
        if !option.is_empty() {
            options.push(option.to_string());
        }
        if options.len() >= 10 {
            break;
        }
    }
    options
}

/// First `n` sentences of an article body, for tool summaries.
pub(crate) fn leading_sentences(text: &str, n: usize) -> String {
    let mut out = String::new();
    let mut count = 0;
    for chunk in text.split_inclusive(". ") {
        out.push_str(chunk);
        count += 1;
        if count >= n {
            break;
        }
    }
    out.trim().to_string()
}

/// Retrieval-tool facade over [`WikipediaClient`].
#[derive(Debug, Clone)]
pub struct WikipediaTool {
    client: WikipediaClient,
    max_titles: usize,
}

impl Default for WikipediaTool {
    fn default() -> Self {
        Self::new(WikipediaClient::new())
    }
}

impl WikipediaTool {
    /// Creates the tool with the research-mode candidate count (3).
    #[must_use]
    pub fn new(client: WikipediaClient) -> Self {
        Self {
            client,
            max_titles: 3,
        }
    }

    /// Formats a found page and related titles into tool text.
    fn format_found(query: &str, page: &WikiPage, related: &[String]) -> String {
        let mut out = format!(
            "Wikipedia search results for '{query}':\n\n**{}**\n{}\nSource: {}\n",
            page.title,
            leading_sentences(&page.text, SUMMARY_SENTENCES),
            page.url
        );
        let others: Vec<&String> = related.iter().filter(|t| **t != page.title).collect();
        if !others.is_empty() {
            out.push_str("\nAdditional related articles:\n");
            for title in others {
                out.push_str(&format!("- {title}: {}\n", article_url(title)));
            }
        }
        out
    }

    async fn lookup(&self, query: &str) -> Result<String, Error> {
        let titles = self.client.search_titles(query, self.max_titles).await?;
        let Some(first) = titles.first() else {
            return Ok(format!("No Wikipedia articles found for query: {query}"));
        };

        match self.client.fetch_page(first).await? {
            PageLookup::Found(page) => Ok(Self::format_found(query, &page, &titles)),
            PageLookup::Ambiguous(options) => {
                // Deterministically resolve to the first option.
                let Some(option) = options.first() else {
                    return Ok(format!("Wikipedia page not found for: {first}"));
                };
                match self.client.fetch_page(option).await? {
                    PageLookup::Found(page) => Ok(format!(
                        "Wikipedia search results for '{query}' (disambiguation resolved):\n\n**{}**\n{}\nSource: {}\n",
                        page.title,
                        leading_sentences(&page.text, SUMMARY_SENTENCES),
                        page.url
                    )),
                    _ => Ok(format!("Wikipedia page not found for: {option}")),
                }
            }
            PageLookup::NotFound => Ok(format!("Wikipedia page not found for: {first}")),
        }
    }
}

#[async_trait]
impl RetrievalTool for WikipediaTool {
    fn name(&self) -> &'static str {
        "wikipedia_search"
    }

    fn description(&self) -> &'static str {
        "Search Wikipedia for encyclopedic information. Best for factual, \
         historical, and scientific information. Input should be a specific \
         topic or article title."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("The topic or article title to search for on Wikipedia")
    }

    async fn invoke(&self, input: &str) -> String {
        match self.lookup(input).await {
            Ok(text) => text,
            // Transport failures become descriptive text, never errors.
            Err(e) => format!("Error searching Wikipedia: {e}"),
        }
    }
}
