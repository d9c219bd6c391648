//! Query-resolution pipeline.
//!
//! One [`QueryResolver`] per process wires the selected provider, the
//! per-mode tool sets, and the iteration caps together. Each incoming
//! query runs as an independent, stateless pipeline execution: a system
//! prompt plus user message goes through the bounded reasoning loop, and
//! the final free-text answer is coerced into a validated record.
//!
//! A resolver without a provider is a valid degraded state: every
//! resolution fails fast with [`Error::NoProviderAvailable`] before any
//! network access.

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::executor::ToolExecutor;
use crate::agent::message::{ChatRequest, system_message, user_message};
use crate::agent::prompt::{
    BOOK_SYSTEM_PROMPT, RESEARCH_SYSTEM_PROMPT, book_user_message, research_user_message,
};
use crate::agent::provider::LlmProvider;
use crate::agent::selector::model_for;
use crate::agent::{ResolverConfig, run_loop};
use crate::error::Error;
use crate::extract::book::{UNKNOWN_AUTHOR, UNKNOWN_YEAR};
use crate::output::{BookRecord, ResearchRecord, parse_book, parse_research};
use crate::tools::book_search::BookSearchTool;
use crate::tools::research_overview::ResearchOverviewTool;
use crate::tools::search::{SearchClient, WebSearchTool};
use crate::tools::webpage::FetchPageTool;
use crate::tools::wikipedia::{WikipediaClient, WikipediaTool};
use crate::tools::{RetrievalTool, ToolSet};

/// Outcome of resolving one line of a multi-line book query.
#[derive(Debug)]
pub struct LineOutcome {
    /// The original query line, verbatim.
    pub query: String,
    /// The resolved record, or the per-line failure.
    pub result: Result<BookRecord, Error>,
}

/// Resolves book and research queries against the selected provider.
pub struct QueryResolver {
    provider: Option<Arc<dyn LlmProvider>>,
    config: ResolverConfig,
    book_executor: ToolExecutor,
    research_executor: ToolExecutor,
}

impl std::fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResolver")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryResolver {
    /// Creates a resolver with the standard per-mode tool sets.
    ///
    /// `provider` may be `None` (degraded mode): the resolver stays up
    /// and fails every query with [`Error::NoProviderAvailable`].
    #[must_use]
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: ResolverConfig) -> Self {
        let wiki = WikipediaClient::new();
        let search = SearchClient::new();

        let book_tools: Vec<Arc<dyn RetrievalTool>> =
            vec![Arc::new(BookSearchTool::new(wiki.clone(), search.clone()))];
        let research_tools: Vec<Arc<dyn RetrievalTool>> = vec![
            Arc::new(ResearchOverviewTool::new(wiki.clone(), search.clone())),
            Arc::new(WikipediaTool::new(wiki)),
            Arc::new(WebSearchTool::new(search)),
            Arc::new(FetchPageTool::default()),
        ];

        Self::with_executors(
            provider,
            config,
            ToolExecutor::new(ToolSet::new(book_tools)),
            ToolExecutor::new(ToolSet::new(research_tools)),
        )
    }

    /// Creates a resolver with explicit tool executors.
    #[must_use]
    pub const fn with_executors(
        provider: Option<Arc<dyn LlmProvider>>,
        config: ResolverConfig,
        book_executor: ToolExecutor,
        research_executor: ToolExecutor,
    ) -> Self {
        Self {
            provider,
            config,
            book_executor,
            research_executor,
        }
    }

    /// Whether a reasoning provider is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolves one book query to a validated record.
    ///
    /// # Errors
    ///
    /// [`Error::NoProviderAvailable`] in degraded mode, [`Error::Provider`]
    /// when a chat call fails, [`Error::Parse`] when the final answer does
    /// not match the book schema, and [`Error::NotFound`] when the answer
    /// is well-formed but carries no information beyond the query itself.
    pub async fn resolve_book(&self, query: &str) -> Result<BookRecord, Error> {
        let provider = self.provider.as_deref().ok_or(Error::NoProviderAvailable)?;

        let mut request = self.request(
            provider,
            BOOK_SYSTEM_PROMPT,
            book_user_message(query),
            &self.book_executor,
        );
        let outcome = run_loop(
            provider,
            &mut request,
            &self.book_executor,
            self.config.book_max_iterations,
        )
        .await?;
        if outcome.capped {
            warn!(query, "book resolution capped; parsing best partial answer");
        }

        let mut record = parse_book(&outcome.content)?;
        if is_empty_answer(&record, query) {
            return Err(Error::NotFound {
                query: query.to_string(),
            });
        }
        // The original line is authoritative over whatever the model
        // echoed back.
        record.search_query = query.to_string();
        info!(query, title = %record.title, "book query resolved");
        Ok(record)
    }

    /// Resolves each non-empty line of a multi-line book query
    /// independently, in input order.
    pub async fn resolve_book_lines(&self, input: &str) -> Vec<LineOutcome> {
        let mut outcomes = Vec::new();
        for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let result = self.resolve_book(line).await;
            outcomes.push(LineOutcome {
                query: line.to_string(),
                result,
            });
        }
        outcomes
    }

    /// Resolves one research topic to a validated record.
    ///
    /// A source hint steers the agent toward a specific URL.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::resolve_book`].
    pub async fn resolve_research(
        &self,
        topic: &str,
        source_hint: Option<&str>,
    ) -> Result<ResearchRecord, Error> {
        let provider = self.provider.as_deref().ok_or(Error::NoProviderAvailable)?;

        let mut request = self.request(
            provider,
            RESEARCH_SYSTEM_PROMPT,
            research_user_message(topic, source_hint),
            &self.research_executor,
        );
        let outcome = run_loop(
            provider,
            &mut request,
            &self.research_executor,
            self.config.research_max_iterations,
        )
        .await?;
        if outcome.capped {
            warn!(topic, "research capped; parsing best partial answer");
        }

        let mut record = parse_research(&outcome.content)?;
        record.topic = topic.to_string();
        // The loop's observed invocation order is authoritative over the
        // model's self-report.
        if !outcome.tools_used.is_empty() {
            record.tools_used = outcome.tools_used;
        }
        info!(topic, sources = record.sources.len(), "research topic resolved");
        Ok(record)
    }

    fn request(
        &self,
        provider: &dyn LlmProvider,
        system_prompt: &str,
        user: String,
        executor: &ToolExecutor,
    ) -> ChatRequest {
        ChatRequest {
            model: model_for(provider.name(), &self.config),
            messages: vec![system_message(system_prompt), user_message(&user)],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            tools: executor.tools().definitions(),
        }
    }
}

/// Whether a parsed book answer carries no information beyond the query:
/// both provenance fields are the unknown sentinels and the title is blank
/// or just the query echoed back.
fn is_empty_answer(record: &BookRecord, query: &str) -> bool {
    record.author == UNKNOWN_AUTHOR
        && record.first_year_published == UNKNOWN_YEAR
        && (record.title.trim().is_empty() || record.title.trim().eq_ignore_ascii_case(query.trim()))
}
