//! Bounded tool-calling reasoning loop.
//!
//! Drives the model ↔ tool round-trip: sends the accumulated transcript to
//! the provider, executes any requested tool calls, appends the results,
//! and repeats until the model produces a final text answer or the
//! iteration cap is reached.
//!
//! The cap is a terminal guard, not a failure: a capped loop still returns
//! its best partial answer, with `capped = true` distinguishing cut-off
//! from conclusion for callers that care (the HTTP surface does not).

use tracing::{debug, warn};

use super::executor::ToolExecutor;
use super::message::{ChatRequest, assistant_tool_calls_message, tool_message};
use super::provider::LlmProvider;
use crate::error::Error;

/// Fallback text when the loop is capped before any assistant text arrived.
const NO_ANSWER_PLACEHOLDER: &str = "No final answer was produced within the iteration limit.";

/// Outcome of one reasoning-loop run.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The model's final (or best partial) free-text answer.
    pub content: String,
    /// Whether the loop hit its iteration cap before the model concluded.
    pub capped: bool,
    /// Names of tools invoked, in invocation order.
    pub tools_used: Vec<String>,
}

/// Runs the reasoning loop: model → tool calls → tool results → model → …
///
/// Single-threaded and cooperative: each iteration issues exactly one chat
/// call, executes the tool calls it requested, and decides whether enough
/// information has been gathered. Malformed tool invocations are caught by
/// the executor and fed back as error observations.
///
/// # Errors
///
/// Returns [`Error::Provider`] only when a chat call itself fails; tool
/// failures never terminate the loop.
pub async fn run_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    executor: &ToolExecutor,
    max_iterations: usize,
) -> Result<LoopOutcome, Error> {
    let mut tools_used = Vec::new();
    let mut best_partial: Option<String> = None;

    for iteration in 0..max_iterations {
        let response = provider.chat(request).await?;

        if !response.content.trim().is_empty() {
            best_partial = Some(response.content.clone());
        }

        // No tool calls means the model has concluded.
        if response.tool_calls.is_empty() {
            debug!(iteration, "reasoning loop concluded with final answer");
            return Ok(LoopOutcome {
                content: response.content,
                capped: false,
                tools_used,
            });
        }

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );

        request
            .messages
            .push(assistant_tool_calls_message(response.tool_calls.clone()));

        for call in &response.tool_calls {
            let result = executor.execute(call).await;
            debug!(
                tool = call.name,
                call_id = call.id,
                is_error = result.is_error,
                "tool execution complete"
            );
            tools_used.push(call.name.clone());
            request
                .messages
                .push(tool_message(&result.tool_call_id, &result.content));
        }
    }

    warn!(
        max_iterations,
        "reasoning loop capped; returning best partial answer"
    );
    Ok(LoopOutcome {
        content: best_partial.unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string()),
        capped: true,
        tools_used,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::agent::message::{ChatResponse, system_message, user_message};
    use crate::tools::{ToolCall, ToolSet};

    /// Mock provider that returns tool calls on the first N calls,
    /// then a final text response.
    struct MockToolProvider {
        call_count: AtomicUsize,
        tool_rounds: usize,
        arguments: String,
    }

    impl MockToolProvider {
        fn new(tool_rounds: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                tool_rounds,
                arguments: r#"{"query":"dune"}"#.to_string(),
            }
        }

        fn with_arguments(tool_rounds: usize, arguments: &str) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                tool_rounds,
                arguments: arguments.to_string(),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockToolProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, Error> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            if count < self.tool_rounds {
                Ok(ChatResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall {
                        id: format!("call_{count}"),
                        name: "wikipedia_search".to_string(),
                        arguments: self.arguments.clone(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                })
            } else {
                Ok(ChatResponse {
                    content: "Final answer based on tool results.".to_string(),
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                })
            }
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![
                system_message("You are a book search assistant."),
                user_message("Find information about the book: Dune"),
            ],
            temperature: Some(0.7),
            max_tokens: Some(1024),
            tools: Vec::new(),
        }
    }

    fn empty_executor() -> ToolExecutor {
        ToolExecutor::new(ToolSet::none())
    }

    #[tokio::test]
    async fn test_loop_single_tool_round() {
        let provider = MockToolProvider::new(1);
        let executor = empty_executor();
        let mut req = request();

        let outcome = match run_loop(&provider, &mut req, &executor, 5).await {
            Ok(o) => o,
            Err(e) => unreachable!("run_loop failed: {e}"),
        };

        assert_eq!(outcome.content, "Final answer based on tool results.");
        assert!(!outcome.capped);
        assert_eq!(outcome.tools_used, vec!["wikipedia_search"]);
        // system + user + assistant(tool_calls) + tool(result) = 4 messages
        assert_eq!(req.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_loop_no_tools_concludes_immediately() {
        let provider = MockToolProvider::new(0);
        let executor = empty_executor();
        let mut req = request();

        let outcome = match run_loop(&provider, &mut req, &executor, 5).await {
            Ok(o) => o,
            Err(e) => unreachable!("run_loop failed: {e}"),
        };

        assert!(!outcome.capped);
        assert!(outcome.tools_used.is_empty());
        assert_eq!(req.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_loop_capped_returns_partial_not_error() {
        // Provider always requests tools (100 rounds > cap of 3)
        let provider = MockToolProvider::new(100);
        let executor = empty_executor();
        let mut req = request();

        let outcome = match run_loop(&provider, &mut req, &executor, 3).await {
            Ok(o) => o,
            Err(e) => unreachable!("capped loop must not fail: {e}"),
        };

        assert!(outcome.capped);
        assert_eq!(outcome.content, NO_ANSWER_PLACEHOLDER);
        assert_eq!(outcome.tools_used.len(), 3);
    }

    #[tokio::test]
    async fn test_loop_never_exceeds_iteration_cap() {
        let provider = MockToolProvider::new(100);
        let executor = empty_executor();
        let mut req = request();

        let _ = run_loop(&provider, &mut req, &executor, 3).await;
        // One chat call per iteration, no more.
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_recovered_in_loop() {
        let provider = MockToolProvider::with_arguments(1, "{not json");
        let executor = empty_executor();
        let mut req = request();

        let outcome = match run_loop(&provider, &mut req, &executor, 5).await {
            Ok(o) => o,
            Err(e) => unreachable!("malformed tool call must not fail the loop: {e}"),
        };

        assert!(!outcome.capped);
        assert_eq!(outcome.content, "Final answer based on tool results.");
        // The error observation was fed back as a tool message.
        let tool_msg = &req.messages[3];
        assert!(tool_msg.content.contains("unknown tool") || tool_msg.content.contains("invalid"));
    }
}
