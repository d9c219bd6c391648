//! Error types for the query-resolution pipeline.
//!
//! The taxonomy mirrors the pipeline's propagation policy: tool-level and
//! network-level failures are recovered locally and converted to text, so
//! only provider unavailability, parse failure, and not-found reach callers
//! as distinct, user-visible outcomes.

use thiserror::Error;

/// Errors surfaced by the query-resolution pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// No reasoning backend could be constructed from the configured
    /// credentials. This is a standing degraded state: every query fails
    /// with this error until the process is restarted with valid keys.
    #[error("no reasoning provider available; set GEMINI_API_KEY or ANTHROPIC_API_KEY")]
    NoProviderAvailable,

    /// The final answer did not match the expected structured schema.
    /// Terminal for the current query; nothing is persisted.
    #[error("failed to parse structured output: {reason}")]
    Parse {
        /// Why validation failed.
        reason: String,
        /// The offending raw text, for caller-level logging.
        raw: String,
    },

    /// The extraction heuristics exhausted every fallback stage without a
    /// qualifying candidate, or a resolved answer carried nothing beyond
    /// the query itself. Distinct from [`Error::Parse`]: the structured
    /// text was fine, it just said nothing.
    #[error("no qualifying result found for query: {query}")]
    NotFound {
        /// The query that came up empty.
        query: String,
    },

    /// A reasoning-backend API call failed.
    #[error("provider request failed: {message}")]
    Provider {
        /// Provider error description.
        message: String,
        /// HTTP status, when the transport reported one.
        status: Option<u16>,
    },

    /// A tool invocation could not be dispatched (unknown tool or
    /// malformed arguments). Recovered inside the reasoning loop as an
    /// error observation; never surfaced to the caller directly.
    #[error("tool '{name}' failed: {message}")]
    Tool {
        /// Name of the tool that failed.
        name: String,
        /// Failure description.
        message: String,
    },

    /// CSV persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] csv::Error),

    /// Filesystem failure at the persistence boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a parse error, truncating oversized raw text for storage.
    #[must_use]
    pub fn parse(reason: impl Into<String>, raw: &str) -> Self {
        const MAX_RAW: usize = 2000;
        let raw = if raw.len() > MAX_RAW {
            let cut = raw
                .char_indices()
                .take_while(|(i, _)| *i < MAX_RAW)
                .last()
                .map_or(0, |(i, c)| i + c.len_utf8());
            format!("{}…", &raw[..cut])
        } else {
            raw.to_string()
        };
        Self::Parse {
            reason: reason.into(),
            raw,
        }
    }
}
