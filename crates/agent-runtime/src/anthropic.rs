//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` over the Anthropic Messages API.
//! Tool calls arrive as `tool_use` content blocks; tool results go back as a
//! `user` message made of `tool_result` blocks.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{ContentBlock, Role, ToolCall, ToolOutcome, Turn},
    provider::{validate_request, Completion, GenerationOptions, LlmProvider, StopReason, TokenUsage},
    tool::ToolContract,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `ANTHROPIC_API_KEY` (required), `ANTHROPIC_BASE_URL` and
    /// `ANTHROPIC_TIMEOUT_SECS`. The model is picked per request through
    /// [`GenerationOptions`].
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key);

        if let Ok(url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout_secs = secs;
        }

        Ok(config)
    }
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration. The HTTP client is built once and reused
    /// for every completion call.
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env()?)
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    /// Convert turns to Anthropic messages
    fn convert_turns(turns: &[Turn]) -> Vec<ApiMessage> {
        turns
            .iter()
            .map(|turn| {
                let role = match turn.role() {
                    Role::Assistant => "assistant",
                    // Tool results travel as a user message
                    Role::User | Role::ToolResult => "user",
                };
                ApiMessage {
                    role: role.into(),
                    content: turn.content().iter().map(Self::convert_block).collect(),
                }
            })
            .collect()
    }

    fn convert_block(block: &ContentBlock) -> ApiBlock {
        match block {
            ContentBlock::Text { text } => ApiBlock::Text { text: text.clone() },
            ContentBlock::ToolCall(call) => ApiBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            },
            ContentBlock::ToolResult(result) => ApiBlock::ToolResult {
                tool_use_id: result.call_id.clone(),
                content: result.outcome.to_payload_string(),
                is_error: result.outcome.is_error(),
            },
        }
    }

    fn convert_tools(tools: &[ToolContract]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    fn build_body(turns: &[Turn], tools: &[ToolContract], options: &GenerationOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": options.model,
            "max_tokens": options.max_tokens,
            "messages": Self::convert_turns(turns),
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::convert_tools(tools));
        }
        if let Some(system) = &options.system_prompt {
            body["system"] = serde_json::json!(system);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }

    /// Convert an API response to an assistant turn
    fn convert_response(response: ApiResponse) -> Completion {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiBlock::Text { text } => Some(ContentBlock::Text { text }),
                ApiBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolCall(ToolCall::new(id, name, input)))
                }
                // The service never answers with tool results
                ApiBlock::ToolResult { .. } => None,
                ApiBlock::Unknown => {
                    tracing::debug!("Skipping unsupported response block");
                    None
                }
            })
            .collect();

        Completion {
            turn: Turn::assistant(content),
            stop_reason: response
                .stop_reason
                .as_deref()
                .map_or_else(|| StopReason::Other("missing".into()), StopReason::from_wire),
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }

    fn status_error(status: reqwest::StatusCode, body: String) -> AgentError {
        match status.as_u16() {
            401 | 403 => AgentError::Auth(body),
            429 => AgentError::RateLimited(body),
            500..=599 => AgentError::ProviderUnavailable(format!("{}: {}", status, body)),
            _ => AgentError::Provider(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await;

        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolContract],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        validate_request(turns)?;

        let body = Self::build_body(turns, tools, options);
        tracing::debug!(model = %options.model, messages = turns.len(), tools = tools.len(), "Sending completion request");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %error_text, "Anthropic API error");
            return Err(Self::status_error(status, error_text));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse Anthropic response: {}", e)))?;

        Ok(Self::convert_response(api_response))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: Vec<ApiBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    /// Block types this adapter does not model (e.g. `thinking`)
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ApiBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::message::ToolResultBlock;
    use agent_core::provider::DEFAULT_MODEL;
    use agent_core::tool::{ParamType, ParameterSchema};
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn tool_results_are_sent_as_user_blocks() {
        let turns = vec![
            Turn::user("Can you search my notes?"),
            Turn::assistant(vec![
                ContentBlock::text("Searching."),
                ContentBlock::ToolCall(ToolCall::new("toolu_1", "search_notes", json!({"query": "blog"}))),
            ]),
            Turn::tool_results(vec![ToolResultBlock {
                call_id: "toolu_1".into(),
                outcome: ToolOutcome::Success(json!([{"id": "n1"}])),
            }]),
        ];

        let messages = serde_json::to_value(AnthropicProvider::convert_turns(&turns)).unwrap();

        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][0]["type"], "text");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"][1]["type"], "tool_use");
        assert_eq!(messages[1]["content"][1]["id"], "toolu_1");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"][0]["type"], "tool_result");
        assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(messages[2]["content"][0]["content"], r#"[{"id":"n1"}]"#);
        assert_eq!(messages[2]["content"][0]["is_error"], false);
    }

    #[test]
    fn failed_tool_result_sets_is_error() {
        let block = ContentBlock::tool_result("t1", ToolOutcome::Error("store down".into()));
        let value = serde_json::to_value(AnthropicProvider::convert_block(&block)).unwrap();
        assert_eq!(value["is_error"], true);
        assert_eq!(value["content"], "store down");
    }

    #[test]
    fn body_carries_contracts_as_input_schema() {
        let tools = vec![ToolContract {
            name: "search_notes".into(),
            description: "Search for notes".into(),
            parameters: vec![ParameterSchema::required("query", ParamType::String, "Query")],
        }];
        let body = AnthropicProvider::build_body(&[Turn::user("hi")], &tools, &GenerationOptions::default());

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["tools"][0]["name"], "search_notes");
        assert_eq!(body["tools"][0]["input_schema"]["required"], json!(["query"]));
        assert!(body.get("system").is_none());
    }

    #[test]
    fn response_maps_tool_use_and_stop_reason() {
        let raw = json!({
            "id": "msg_1",
            "model": "claude-3-haiku-20240307",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_9", "name": "search_notes", "input": {"query": "blog writing tips"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 7}
        });
        let response: ApiResponse = serde_json::from_value(raw).unwrap();
        let completion = AnthropicProvider::convert_response(response);

        assert_eq!(completion.stop_reason, StopReason::ToolUse);
        assert_eq!(completion.turn.role(), Role::Assistant);
        let call = completion.turn.tool_calls().next().unwrap();
        assert_eq!(call.id, "toolu_9");
        assert_eq!(call.input, json!({"query": "blog writing tips"}));
        assert_eq!(completion.usage.unwrap().total(), 19);
    }

    #[test]
    fn unsupported_response_blocks_are_skipped() {
        let raw = json!({
            "model": "claude-3-haiku-20240307",
            "stop_reason": "end_turn",
            "content": [
                {"type": "thinking", "thinking": "Recall the notes.", "signature": "sig"},
                {"type": "text", "text": "Use short paragraphs."}
            ]
        });
        let response: ApiResponse = serde_json::from_value(raw).unwrap();
        let completion = AnthropicProvider::convert_response(response);

        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.turn.content().len(), 1);
        assert_eq!(completion.turn.text(), "Use short paragraphs.");
    }

    #[test]
    fn status_codes_map_to_completion_errors() {
        use reqwest::StatusCode;
        assert!(matches!(
            AnthropicProvider::status_error(StatusCode::UNAUTHORIZED, String::new()),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            AnthropicProvider::status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AgentError::RateLimited(_)
        ));
        assert!(AnthropicProvider::status_error(StatusCode::BAD_REQUEST, String::new())
            .is_completion_failure());
    }
}
