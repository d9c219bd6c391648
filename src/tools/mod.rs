//! Retrieval tools and provider-agnostic function-calling types.
//!
//! Each retrieval tool is an independent, stateless lookup over one
//! capability (encyclopedic lookup, web search, single-page fetch, or the
//! composed book/research heuristics). Tools always return text plus
//! provenance; transport failures are converted to descriptive text so the
//! reasoning loop never sees a network error.
//!
//! The tool manifest ([`ToolSet`]) is built once at startup from the trait
//! objects themselves, so the definitions sent to the model and the
//! dispatch table can never drift apart.

pub mod book_search;
pub mod research_overview;
pub mod search;
pub mod webpage;
pub mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the manifest the executor dispatches over).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result text (tool output on success, error description on failure).
    pub content: String,
    /// Whether this result represents an error observation.
    pub is_error: bool,
}

/// A single retrieval capability exposed to the reasoning loop.
///
/// Implementations must be stateless between invocations and must catch
/// their own transport errors, returning them as descriptive text.
#[async_trait]
pub trait RetrievalTool: Send + Sync {
    /// Tool name as presented to the model.
    fn name(&self) -> &'static str;

    /// Tool description for the manifest.
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's arguments.
    fn parameters(&self) -> serde_json::Value;

    /// Runs the lookup. Never fails: transport and parse errors come back
    /// as descriptive text the model can read.
    async fn invoke(&self, input: &str) -> String;

    /// Builds this tool's manifest entry.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// A set of retrieval tools scoped to an agent mode.
///
/// Book mode gets the composed `book_search` heuristic only (it runs the
/// whole fallback chain internally); research mode gets the raw tools plus
/// the `research_overview` composition.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn RetrievalTool>>,
}

impl ToolSet {
    /// Builds a set from trait objects.
    #[must_use]
    pub fn new(tools: Vec<Arc<dyn RetrievalTool>>) -> Self {
        Self { tools }
    }

    /// Empty tool set (no tools available).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the manifest entries for every tool in this set.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Looks a tool up by its manifest name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RetrievalTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolSet").field("tools", &names).finish()
    }
}

/// Standard JSON Schema for tools that take a single `query` string.
#[must_use]
pub(crate) fn query_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": description
            }
        },
        "required": ["query"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl RetrievalTool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo back the input"
        }

        fn parameters(&self) -> serde_json::Value {
            query_schema("Text to echo")
        }

        async fn invoke(&self, input: &str) -> String {
            format!("echo: {input}")
        }
    }

    #[test]
    fn test_toolset_manifest() {
        let set = ToolSet::new(vec![Arc::new(EchoTool)]);
        assert_eq!(set.len(), 1);
        let defs = set.definitions();
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["type"], "object");
        assert!(set.get("echo").is_some());
        assert!(set.get("missing").is_none());
    }

    #[test]
    fn test_toolset_none() {
        let set = ToolSet::none();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.definitions().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_through_trait_object() {
        let set = ToolSet::new(vec![Arc::new(EchoTool)]);
        let tool = set.get("echo").map(Arc::clone);
        let out = match tool {
            Some(t) => t.invoke("hi").await,
            None => unreachable!("echo tool registered above"),
        };
        assert_eq!(out, "echo: hi");
    }

    #[test]
    fn test_tool_call_serialization() {
        let call = ToolCall {
            id: "call_123".to_string(),
            name: "web_search".to_string(),
            arguments: r#"{"query":"dune"}"#.to_string(),
        };
        let json = serde_json::to_string(&call).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(json.contains("web_search"));
    }
}
