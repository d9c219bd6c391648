//! Topic-overview retrieval tool.
//!
//! Facade over the research extraction chain: produces a sourced
//! summary digest for an open-ended topic in one tool call.

use async_trait::async_trait;

use super::{RetrievalTool, query_schema};
use crate::extract::research::{ResearchCandidate, research_overview};
use crate::tools::search::SearchClient;
use crate::tools::wikipedia::WikipediaClient;

/// Formats an overview candidate as the tool text the loop reads.
#[must_use]
pub fn format_overview(topic: &str, candidate: &ResearchCandidate) -> String {
    let mut out = format!("Overview of '{topic}':\n{}\n", candidate.summary);
    if !candidate.sources.is_empty() {
        out.push_str("\nSources:\n");
        for url in &candidate.sources {
            out.push_str(&format!("- {url}\n"));
        }
    }
    out.push_str(&candidate.provenance());
    out
}

/// Retrieval tool producing a sourced topic overview.
#[derive(Debug, Clone, Default)]
pub struct ResearchOverviewTool {
    wiki: WikipediaClient,
    search: SearchClient,
}

impl ResearchOverviewTool {
    /// Creates the tool over existing clients.
    #[must_use]
    pub const fn new(wiki: WikipediaClient, search: SearchClient) -> Self {
        Self { wiki, search }
    }
}

#[async_trait]
impl RetrievalTool for ResearchOverviewTool {
    fn name(&self) -> &'static str {
        "research_overview"
    }

    fn description(&self) -> &'static str {
        "Get a sourced overview of a research topic in one step. Combines \
         encyclopedia and web-search results into a summary with source \
         URLs. Input should be the topic to research."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("The topic to build an overview for")
    }

    async fn invoke(&self, input: &str) -> String {
        match research_overview(&self.wiki, &self.search, input).await {
            Ok(candidate) => format_overview(input, &candidate),
            Err(e) => format!("No overview could be built for '{input}': {e}"),
        }
    }
}
