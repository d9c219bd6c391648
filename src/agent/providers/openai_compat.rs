//! OpenAI-compatible provider implementation using the `async-openai` crate.
//!
//! Both configured backends (Gemini, Anthropic) expose OpenAI-compatible
//! chat-completion endpoints, so a single implementation parameterized by
//! base URL and name covers the whole credential list.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestToolMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequest, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;

use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role};
use crate::agent::provider::LlmProvider;
use crate::error::Error;
use crate::tools::ToolCall;

/// OpenAI-compatible reasoning-backend provider.
///
/// Wraps the `async-openai` client for chat completions against any API
/// that follows the OpenAI chat-completion spec.
pub struct OpenAiCompatProvider {
    name: &'static str,
    client: Client<OpenAIConfig>,
}

impl OpenAiCompatProvider {
    /// Creates a new provider for the given backend name, key, and base URL.
    ///
    /// The timeout bounds each HTTP attempt and caps the retry budget, so a
    /// single `chat` call cannot hang past it.
    #[must_use]
    pub fn new(name: &'static str, api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        let retry_policy = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(timeout))
            .build();
        Self {
            name,
            client: Client::build(http_client, config, retry_policy),
        }
    }

    /// Converts our message type to the OpenAI SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                    msg.content.clone(),
                ),
                name: None,
            }),
            Role::Assistant => {
                let tool_calls = if msg.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        msg.tool_calls
                            .iter()
                            .map(|tc| ChatCompletionMessageToolCall {
                                id: tc.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                };

                let content = if msg.content.is_empty() {
                    None
                } else {
                    Some(
                        async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        ),
                    )
                };

                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content,
                    name: None,
                    tool_calls,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
            Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: async_openai::types::ChatCompletionRequestToolMessageContent::Text(
                    msg.content.clone(),
                ),
                tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
            }),
        }
    }

    /// Builds an OpenAI chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        let messages: Vec<_> = request.messages.iter().map(Self::convert_message).collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|td| ChatCompletionTool {
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionObject {
                            name: td.name.clone(),
                            description: Some(td.description.clone()),
                            parameters: Some(td.parameters.clone()),
                            strict: None,
                        },
                    })
                    .collect(),
            )
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature.filter(|&t| t != 0.0),
            max_completion_tokens: request.max_tokens,
            tools,
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("name", &self.name)
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, Error> {
        let api_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| Error::Provider {
                message: e.to_string(),
                status: None,
            })?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let tool_calls = choice
            .and_then(|c| c.message.tool_calls.as_ref())
            .map(|tcs| {
                tcs.iter()
                    .map(|tc| ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message;
    use crate::tools::ToolDefinition;

    #[test]
    fn test_convert_system_message() {
        let msg = message::system_message("test");
        let converted = OpenAiCompatProvider::convert_message(&msg);
        assert!(matches!(converted, ChatCompletionRequestMessage::System(_)));
    }

    #[test]
    fn test_convert_tool_message() {
        let msg = message::tool_message("call_123", "result data");
        let converted = OpenAiCompatProvider::convert_message(&msg);
        assert!(matches!(converted, ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_convert_assistant_with_tool_calls() {
        let msg = message::assistant_tool_calls_message(vec![ToolCall {
            id: "call_1".to_string(),
            name: "web_search".to_string(),
            arguments: r#"{"query":"dune"}"#.to_string(),
        }]);
        let converted = OpenAiCompatProvider::convert_message(&msg);
        if let ChatCompletionRequestMessage::Assistant(a) = converted {
            assert_eq!(a.tool_calls.as_ref().map_or(0, Vec::len), 1);
        } else {
            unreachable!("expected Assistant message");
        }
    }

    #[test]
    fn test_build_request_with_tools() {
        let request = ChatRequest {
            model: "gemini-1.5-flash".to_string(),
            messages: vec![message::user_message("test")],
            temperature: Some(0.7),
            max_tokens: Some(100),
            tools: vec![ToolDefinition {
                name: "web_search".to_string(),
                description: "Search the web".to_string(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }],
        };
        let built = OpenAiCompatProvider::build_request(&request);
        assert_eq!(built.tools.as_ref().map_or(0, Vec::len), 1);
        assert_eq!(built.max_completion_tokens, Some(100));
    }

    #[test]
    fn test_build_request_zero_temperature_omitted() {
        let request = ChatRequest {
            model: "gemini-1.5-flash".to_string(),
            messages: vec![message::user_message("test")],
            temperature: Some(0.0),
            max_tokens: None,
            tools: Vec::new(),
        };
        let built = OpenAiCompatProvider::build_request(&request);
        assert!(built.temperature.is_none());
        assert!(built.tools.is_none());
    }

    #[test]
    fn test_provider_name() {
        let provider = OpenAiCompatProvider::new(
            "gemini",
            "key",
            "https://example.com/v1",
            Duration::from_secs(120),
        );
        assert_eq!(provider.name(), "gemini");
    }

    #[tokio::test]
    async fn test_chat_aborts_when_backend_stalls_past_timeout() {
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => unreachable!("failed to bind stub listener: {e}"),
        };
        let addr = match listener.local_addr() {
            Ok(a) => a,
            Err(e) => unreachable!("failed to read stub address: {e}"),
        };
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            axum::routing::post(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "{}"
            }),
        );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let provider = OpenAiCompatProvider::new(
            "gemini",
            "key",
            &format!("http://{addr}/v1"),
            Duration::from_millis(200),
        );
        let request = ChatRequest {
            model: "gemini-1.5-flash".to_string(),
            messages: vec![message::user_message("hello")],
            temperature: None,
            max_tokens: None,
            tools: Vec::new(),
        };

        let started = std::time::Instant::now();
        let result = provider.chat(&request).await;
        assert!(matches!(result, Err(Error::Provider { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
