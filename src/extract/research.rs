//! Topic-overview extraction.
//!
//! Wikipedia-first, web-search-fallback: the first found encyclopedia
//! article for a topic supplies the summary and source; when no article
//! exists, the top web results are merged into a snippet digest. Sources
//! and tools-used lists preserve consultation order.

use tracing::debug;

use super::SourceKind;
use crate::error::Error;
use crate::tools::search::SearchClient;
use crate::tools::wikipedia::{PageLookup, WikiPage, WikipediaClient, leading_sentences};

/// Candidate titles examined in the encyclopedic stage.
const WIKI_CANDIDATES: usize = 3;
/// Web results merged into the fallback digest.
const WEB_SOURCES: usize = 5;
/// Sentences lifted from an accepted article.
const SUMMARY_SENTENCES: usize = 5;

/// Best-effort structured overview of one research topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchCandidate {
    /// Original topic text, carried verbatim.
    pub topic: String,
    /// Extracted summary text.
    pub summary: String,
    /// Source URLs in consultation order.
    pub sources: Vec<String>,
    /// Tool names in invocation order.
    pub tools_used: Vec<String>,
    /// Stage that produced the candidate.
    pub source_kind: SourceKind,
}

impl ResearchCandidate {
    /// Provenance line appended to the human-readable tool text.
    #[must_use]
    pub fn provenance(&self) -> String {
        format!(
            "Source: {} ({})",
            self.source_kind.label(),
            self.sources.first().map_or("none", String::as_str)
        )
    }
}

/// Resolves a topic overview through both fallback stages.
///
/// Returns [`Error::NotFound`] when neither stage yields any content.
pub async fn research_overview(
    wiki: &WikipediaClient,
    search: &SearchClient,
    topic: &str,
) -> Result<ResearchCandidate, Error> {
    if let Some(candidate) = encyclopedic_stage(wiki, topic).await {
        return Ok(candidate);
    }
    if let Some(candidate) = web_stage(search, topic).await {
        return Ok(candidate);
    }
    Err(Error::NotFound {
        query: topic.to_string(),
    })
}

/// Encyclopedic stage: first found article wins, ambiguity resolved to
/// the first option.
async fn encyclopedic_stage(wiki: &WikipediaClient, topic: &str) -> Option<ResearchCandidate> {
    let titles = match wiki.search_titles(topic, WIKI_CANDIDATES).await {
        Ok(titles) => titles,
        Err(e) => {
            debug!(topic, error = %e, "encyclopedic search failed");
            return None;
        }
    };
    for title in titles {
        match wiki.fetch_page(&title).await {
            Ok(PageLookup::Found(page)) => return Some(from_article(topic, &page)),
            Ok(PageLookup::Ambiguous(options)) => {
                let Some(option) = options.first() else {
                    continue;
                };
                if let Ok(PageLookup::Found(page)) = wiki.fetch_page(option).await {
                    return Some(from_article(topic, &page));
                }
            }
            Ok(PageLookup::NotFound) => {}
            Err(e) => {
                debug!(%title, error = %e, "page fetch failed");
            }
        }
    }
    None
}

/// Web stage: merges the top result snippets into one digest.
async fn web_stage(search: &SearchClient, topic: &str) -> Option<ResearchCandidate> {
    let hits = match search.search(topic).await {
        Ok(hits) => hits,
        Err(e) => {
            debug!(error = %e, "web fallback search failed");
            return None;
        }
    };
    if hits.is_empty() {
        return None;
    }
    let snippets: Vec<String> = hits
        .iter()
        .take(WEB_SOURCES)
        .map(|hit| hit.snippet.clone())
        .filter(|s| !s.is_empty())
        .collect();
    let sources: Vec<String> = hits.iter().take(WEB_SOURCES).map(|h| h.url.clone()).collect();
    Some(ResearchCandidate {
        topic: topic.to_string(),
        summary: snippets.join(" "),
        sources,
        tools_used: vec!["web_search".to_string()],
        source_kind: SourceKind::WebSearch,
    })
}

fn from_article(topic: &str, page: &WikiPage) -> ResearchCandidate {
    ResearchCandidate {
        topic: topic.to_string(),
        summary: leading_sentences(&page.text, SUMMARY_SENTENCES),
        sources: vec![page.url.clone()],
        tools_used: vec!["wikipedia_search".to_string()],
        source_kind: SourceKind::Encyclopedia,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_candidate_fields() {
        let page = WikiPage {
            title: "Quantum computing".to_string(),
            text: "Quantum computing is a type of computation. It exploits \
                   quantum states. Qubits replace classical bits. More text \
                   follows. And more. And even more."
                .to_string(),
            url: "https://en.wikipedia.org/wiki/Quantum_computing".to_string(),
        };
        let candidate = from_article("quantum computing", &page);
        assert_eq!(candidate.topic, "quantum computing");
        assert!(candidate.summary.starts_with("Quantum computing is a type"));
        assert_eq!(
            candidate.sources,
            vec!["https://en.wikipedia.org/wiki/Quantum_computing".to_string()]
        );
        assert_eq!(candidate.tools_used, vec!["wikipedia_search".to_string()]);
        assert_eq!(candidate.source_kind, SourceKind::Encyclopedia);
    }

    #[test]
    fn test_provenance_names_first_source() {
        let candidate = ResearchCandidate {
            topic: "t".to_string(),
            summary: "s".to_string(),
            sources: vec!["https://a.example".to_string(), "https://b.example".to_string()],
            tools_used: vec!["web_search".to_string()],
            source_kind: SourceKind::WebSearch,
        };
        assert_eq!(candidate.provenance(), "Source: Web search (https://a.example)");
    }

    #[test]
    fn test_provenance_without_sources() {
        let candidate = ResearchCandidate {
            topic: "t".to_string(),
            summary: "s".to_string(),
            sources: Vec::new(),
            tools_used: Vec::new(),
            source_kind: SourceKind::Encyclopedia,
        };
        assert_eq!(candidate.provenance(), "Source: Wikipedia (none)");
    }
}
