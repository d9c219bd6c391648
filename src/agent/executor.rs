//! Tool executor that dispatches model tool calls to retrieval tools.
//!
//! Dispatch runs over the [`ToolSet`] manifest built at startup, so the
//! definitions the model sees and the functions that execute are always
//! the same set. Malformed requests (unknown tool, oversized or
//! unparsable arguments) come back as error observations, never as
//! pipeline failures.

use tracing::debug;

use crate::error::Error;
use crate::tools::{ToolCall, ToolResult, ToolSet};

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Executes tool calls against a fixed retrieval tool set.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    tools: ToolSet,
}

impl ToolExecutor {
    /// Creates a new executor over the given tool set.
    #[must_use]
    pub fn new(tools: ToolSet) -> Self {
        Self { tools }
    }

    /// Returns the tool set this executor dispatches over.
    #[must_use]
    pub const fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Dispatches a tool call to the matching retrieval tool.
    ///
    /// Validates raw argument size and shape before dispatch. All failure
    /// modes produce a `ToolResult` with `is_error = true` that the
    /// reasoning loop feeds back into the transcript.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return error_result(
                call,
                format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
            );
        }

        let Some(tool) = self.tools.get(&call.name) else {
            return error_result(call, format!("unknown tool '{}'", call.name));
        };

        let input = match extract_input(&call.name, &call.arguments) {
            Ok(input) => input,
            Err(e) => return error_result(call, e.to_string()),
        };

        debug!(tool = call.name, call_id = call.id, "executing tool call");
        let content = tool.invoke(&input).await;

        ToolResult {
            tool_call_id: call.id.clone(),
            content,
            is_error: false,
        }
    }
}

/// Builds an error observation for a failed dispatch.
fn error_result(call: &ToolCall, message: String) -> ToolResult {
    debug!(tool = call.name, call_id = call.id, error = %message, "tool dispatch failed");
    ToolResult {
        tool_call_id: call.id.clone(),
        content: message,
        is_error: true,
    }
}

/// Extracts the single string input from a tool call's JSON arguments.
///
/// Every retrieval tool takes one string parameter; accepts either a JSON
/// object with one string property or a bare JSON string.
fn extract_input(name: &str, arguments: &str) -> Result<String, Error> {
    let value: serde_json::Value =
        serde_json::from_str(arguments).map_err(|e| Error::Tool {
            name: name.to_string(),
            message: format!("invalid arguments: {e}"),
        })?;

    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Object(map) => map
            .values()
            .find_map(|v| v.as_str().map(ToString::to_string))
            .ok_or_else(|| Error::Tool {
                name: name.to_string(),
                message: "arguments contain no string input".to_string(),
            }),
        other => Err(Error::Tool {
            name: name.to_string(),
            message: format!("unexpected argument shape: {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::tools::{RetrievalTool, query_schema};

    struct UppercaseTool;

    #[async_trait]
    impl RetrievalTool for UppercaseTool {
        fn name(&self) -> &'static str {
            "uppercase"
        }

        fn description(&self) -> &'static str {
            "Uppercase the input"
        }

        fn parameters(&self) -> serde_json::Value {
            query_schema("Text to transform")
        }

        async fn invoke(&self, input: &str) -> String {
            input.to_uppercase()
        }
    }

    fn executor() -> ToolExecutor {
        ToolExecutor::new(ToolSet::new(vec![Arc::new(UppercaseTool)]))
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_object_arguments() {
        let result = executor()
            .execute(&call("uppercase", r#"{"query":"dune"}"#))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.content, "DUNE");
        assert_eq!(result.tool_call_id, "call_1");
    }

    #[tokio::test]
    async fn test_execute_bare_string_arguments() {
        let result = executor().execute(&call("uppercase", r#""dune""#)).await;
        assert!(!result.is_error);
        assert_eq!(result.content, "DUNE");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_observation() {
        let result = executor().execute(&call("missing", "{}")).await;
        assert!(result.is_error);
        assert!(result.content.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_error_observation() {
        let result = executor().execute(&call("uppercase", "{not json")).await;
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments"));
    }

    #[tokio::test]
    async fn test_missing_string_input_is_error_observation() {
        let result = executor()
            .execute(&call("uppercase", r#"{"query": 42}"#))
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("no string input"));
    }

    #[tokio::test]
    async fn test_oversized_arguments_rejected() {
        let huge = format!(r#"{{"query":"{}"}}"#, "x".repeat(200_000));
        let result = executor().execute(&call("uppercase", &huge)).await;
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }
}
