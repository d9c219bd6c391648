//! Resolver configuration with builder pattern and environment variable
//! support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults. Credentials form an ordered priority list; an
//! empty list is a valid, non-fatal state (degraded mode).

use std::time::Duration;

/// Default model for the Gemini backend.
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
/// Default model for the Anthropic backend.
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
/// Gemini's OpenAI-compatible endpoint.
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
/// Anthropic's OpenAI-compatible endpoint.
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default maximum tokens per completion.
const DEFAULT_MAX_TOKENS: u32 = 2048;
/// Iteration cap for single-entity (book) lookups.
const DEFAULT_BOOK_MAX_ITERATIONS: usize = 3;
/// Iteration cap for open-ended research queries.
const DEFAULT_RESEARCH_MAX_ITERATIONS: usize = 5;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Kind of reasoning-backend credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Google Gemini (primary).
    Gemini,
    /// Anthropic Claude (secondary).
    Anthropic,
}

impl CredentialKind {
    /// Name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }
}

/// One configured reasoning-backend credential.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Which backend this key belongs to.
    pub kind: CredentialKind,
    /// The API key value.
    pub key: String,
}

/// Configuration for the query resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Priority-ordered credential list (primary first).
    pub credentials: Vec<Credential>,
    /// Model identifier for the Gemini backend.
    pub gemini_model: String,
    /// Model identifier for the Anthropic backend.
    pub anthropic_model: String,
    /// Base URL for the Gemini OpenAI-compatible endpoint.
    pub gemini_base_url: String,
    /// Base URL for the Anthropic OpenAI-compatible endpoint.
    pub anthropic_base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Iteration cap for book-mode reasoning loops.
    pub book_max_iterations: usize,
    /// Iteration cap for research-mode reasoning loops.
    pub research_max_iterations: usize,
    /// Per-call request timeout.
    pub timeout: Duration,
}

impl ResolverConfig {
    /// Creates a new builder for `ResolverConfig`.
    #[must_use]
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// `GEMINI_API_KEY` and `ANTHROPIC_API_KEY` populate the credential
    /// list in priority order. Absence of both keys is valid: the
    /// resolver starts in degraded mode.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }
}

/// Builder for [`ResolverConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    credentials: Option<Vec<Credential>>,
    gemini_model: Option<String>,
    anthropic_model: Option<String>,
    gemini_base_url: Option<String>,
    anthropic_base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    book_max_iterations: Option<usize>,
    research_max_iterations: Option<usize>,
    timeout: Option<Duration>,
}

impl ResolverConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.credentials.is_none() {
            let mut credentials = Vec::new();
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                credentials.push(Credential {
                    kind: CredentialKind::Gemini,
                    key,
                });
            }
            if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
                credentials.push(Credential {
                    kind: CredentialKind::Anthropic,
                    key,
                });
            }
            self.credentials = Some(credentials);
        }
        if self.gemini_model.is_none() {
            self.gemini_model = std::env::var("REFDESK_GEMINI_MODEL").ok();
        }
        if self.anthropic_model.is_none() {
            self.anthropic_model = std::env::var("REFDESK_ANTHROPIC_MODEL").ok();
        }
        self
    }

    /// Sets the credential list (priority order).
    #[must_use]
    pub fn credentials(mut self, credentials: Vec<Credential>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the Gemini model.
    #[must_use]
    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = Some(model.into());
        self
    }

    /// Sets the Anthropic model.
    #[must_use]
    pub fn anthropic_model(mut self, model: impl Into<String>) -> Self {
        self.anthropic_model = Some(model.into());
        self
    }

    /// Sets the Gemini base URL.
    #[must_use]
    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = Some(url.into());
        self
    }

    /// Sets the Anthropic base URL.
    #[must_use]
    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = Some(url.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the maximum tokens per completion.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the book-mode iteration cap.
    #[must_use]
    pub const fn book_max_iterations(mut self, n: usize) -> Self {
        self.book_max_iterations = Some(n);
        self
    }

    /// Sets the research-mode iteration cap.
    #[must_use]
    pub const fn research_max_iterations(mut self, n: usize) -> Self {
        self.research_max_iterations = Some(n);
        self
    }

    /// Sets the per-call request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Builds the [`ResolverConfig`].
    #[must_use]
    pub fn build(self) -> ResolverConfig {
        ResolverConfig {
            credentials: self.credentials.unwrap_or_default(),
            gemini_model: self
                .gemini_model
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            anthropic_model: self
                .anthropic_model
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            gemini_base_url: self
                .gemini_base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            anthropic_base_url: self
                .anthropic_base_url
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            book_max_iterations: self
                .book_max_iterations
                .unwrap_or(DEFAULT_BOOK_MAX_ITERATIONS),
            research_max_iterations: self
                .research_max_iterations
                .unwrap_or(DEFAULT_RESEARCH_MAX_ITERATIONS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ResolverConfig::builder().build();
        assert!(config.credentials.is_empty());
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.anthropic_model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.book_max_iterations, 3);
        assert_eq!(config.research_max_iterations, 5);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ResolverConfig::builder()
            .credentials(vec![Credential {
                kind: CredentialKind::Anthropic,
                key: "k".to_string(),
            }])
            .gemini_model("gemini-2.0-flash")
            .book_max_iterations(4)
            .timeout(Duration::from_secs(30))
            .build();
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.credentials[0].kind, CredentialKind::Anthropic);
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.book_max_iterations, 4);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_credential_kind_names() {
        assert_eq!(CredentialKind::Gemini.as_str(), "gemini");
        assert_eq!(CredentialKind::Anthropic.as_str(), "anthropic");
    }
}
