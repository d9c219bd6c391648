//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls. This keeps all pipeline logic decoupled
//! from any particular LLM vendor.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::Error;

/// Trait for reasoning-backend providers.
///
/// Implementations handle the transport layer for a specific provider
/// while presenting a uniform interface to the reasoning loop. A provider
/// handle is constructed once at process start, shared read-only across
/// queries, and torn down only at shutdown.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"gemini"`, `"anthropic"`).
    fn name(&self) -> &'static str;

    /// Executes one chat-completion call carrying the accumulated
    /// transcript and the tool manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] on API failures, timeouts, or response
    /// decoding errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, Error>;
}
