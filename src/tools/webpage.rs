//! Single-page fetch with readable-content extraction.
//!
//! Retrieves one URL, strips non-content markup regions (navigation,
//! headers, footers, scripts, styles), and extracts body text using a
//! prioritized list of structural selectors, falling back to
//! concatenating paragraph/heading/section-like elements. Extracted text
//! is capped to bound downstream processing. Transport failures and empty
//! extractions are reported as typed text, never as errors.

use std::time::Duration;

use async_trait::async_trait;
use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::RetrievalTool;

/// Cap on extracted body text, in characters.
const MAX_CONTENT_CHARS: usize = 15_000;
/// Request timeout for page fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Browser user-agent; many sites reject bare clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Structural selectors tried in priority order for the main content area.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".post",
    ".entry",
    ".blog-post",
    ".post-content",
    "#content",
    ".main-content",
];

/// Fallback element set: paragraph/heading/section-like elements.
const FALLBACK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, article, section, li";

/// Markup regions stripped from every extraction.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer"];

/// Cap on sample links shown in the formatted report.
const SAMPLE_LINK_CAP: usize = 10;

/// Readable content extracted from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Document title, if present.
    pub title: Option<String>,
    /// Meta description, if present.
    pub description: Option<String>,
    /// Extracted, capped body text. Empty when nothing readable was found.
    pub body: String,
    /// Same-site link targets, in document order.
    pub internal_links: Vec<String>,
}

/// Low-level page-fetch client.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: reqwest::Client,
}

impl Default for PageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PageClient {
    /// Creates a client with the fixed fetch timeout and browser UA.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetches one URL and returns its raw HTML.
    async fn fetch_html(&self, url: &str) -> Result<String, String> {
        debug!(url, "page fetch");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))
    }
}

/// Extracts readable content from an HTML document. The page URL is used
/// to classify link targets as internal.
#[must_use]
pub fn extract_content(html: &str, url: &str) -> PageContent {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title");
    let description = Selector::parse(r#"meta[name="description"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty());

    // Semantic content containers first.
    let mut body = String::new();
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = clean_text(&visible_text(&element));
                if !text.is_empty() {
                    body = text;
                    break;
                }
            }
        }
    }

    // Fall back to concatenating paragraph/heading/section-like elements.
    if body.is_empty() {
        if let Ok(selector) = Selector::parse(FALLBACK_SELECTOR) {
            let parts: Vec<String> = document
                .select(&selector)
                .map(|el| clean_text(&visible_text(&el)))
                .filter(|t| !t.is_empty())
                .collect();
            body = parts.join(" ");
        }
    }

    PageContent {
        title,
        description,
        body: truncate_chars(&body, MAX_CONTENT_CHARS),
        internal_links: internal_links(&document, url),
    }
}

/// Collects link targets that stay on the same site: absolute URLs
/// containing the page URL, root-relative paths, and bare relative paths.
fn internal_links(document: &Html, url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| {
            !href.is_empty()
                && (href.contains(url) || href.starts_with('/') || !href.starts_with("http"))
        })
        .map(str::to_string)
        .collect()
}

/// Text of the first element matching a selector.
fn select_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|s| !s.is_empty())
}

/// Collects text under an element, skipping stripped markup regions.
fn visible_text(element: &ElementRef<'_>) -> String {
    let mut chunks: Vec<&str> = Vec::new();
    let mut skip_depth = 0usize;

    for edge in element.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                scraper::Node::Element(el) => {
                    if STRIPPED_ELEMENTS.contains(&el.name()) {
                        skip_depth += 1;
                    }
                }
                scraper::Node::Text(text) => {
                    if skip_depth == 0 {
                        chunks.push(text);
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                if let scraper::Node::Element(el) = node.value() {
                    if STRIPPED_ELEMENTS.contains(&el.name()) && skip_depth > 0 {
                        skip_depth -= 1;
                    }
                }
            }
        }
    }

    chunks.join(" ")
}

/// Collapses runs of whitespace into single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

/// Formats extracted content as the tool text the reasoning loop reads.
#[must_use]
pub fn format_content(url: &str, content: &PageContent) -> String {
    if content.body.trim().is_empty() {
        return format!(
            "No readable content found on {url}. The page might be JavaScript-heavy or have restricted access."
        );
    }
    let sample_links = if content.internal_links.is_empty() {
        "None found".to_string()
    } else {
        content
            .internal_links
            .iter()
            .take(SAMPLE_LINK_CAP)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Complete analysis of {url}:\nTITLE: {}\n\nDESCRIPTION: {}\n\nMAIN CONTENT:\n{}\n\nINTERNAL LINKS FOUND: {} links\nSAMPLE LINKS: {sample_links}",
        content.title.as_deref().unwrap_or("No title found"),
        content.description.as_deref().unwrap_or(""),
        content.body,
        content.internal_links.len()
    )
}

/// Retrieval-tool facade: fetches and summarizes one URL.
#[derive(Debug, Clone, Default)]
pub struct FetchPageTool {
    client: PageClient,
}

impl FetchPageTool {
    /// Creates the tool over an existing client.
    #[must_use]
    pub const fn new(client: PageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RetrievalTool for FetchPageTool {
    fn name(&self) -> &'static str {
        "fetch_page"
    }

    fn description(&self) -> &'static str {
        "Fetch and extract text content from a specific website URL. \
         Provide the full URL (e.g., https://example.com)."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The full URL of the page to fetch"
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: &str) -> String {
        match self.client.fetch_html(input).await {
            Ok(html) => format_content(input, &extract_content(&html, input)),
            Err(message) => format!("Error fetching content from {input}: {message}"),
        }
    }
}
