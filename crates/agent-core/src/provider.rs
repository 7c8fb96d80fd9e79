//! LLM Provider Strategy Pattern
//!
//! Defines the completion-service boundary used by the agent loop.
//! One call takes the whole conversation plus the published tool contracts
//! and returns exactly one assistant turn and the reason generation stopped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{LlmProvider, GenerationOptions};
//!
//! let provider = AnthropicProvider::from_env()?;
//! let completion = provider
//!     .complete(conversation.turns(), &registry.contracts(), &GenerationOptions::default())
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Role, Turn};
use crate::tool::ToolContract;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for sampling (provider default when unset)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// System prompt, sent separately from the turns
    #[serde(default)]
    pub system_prompt: Option<String>,
}

pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

fn default_max_tokens() -> u32 { 1024 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: default_max_tokens(),
            temperature: None,
            system_prompt: None,
        }
    }
}

/// Why the completion service stopped generating
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural completion
    EndTurn,
    /// The turn requests one or more tool calls
    ToolUse,
    /// Generation token cap reached
    MaxTokens,
    /// A configured stop sequence was produced
    StopSequence,
    /// Anything the service reports that we do not model
    Other(String),
}

impl StopReason {
    /// Parse the service's wire value
    pub fn from_wire(value: &str) -> Self {
        match value {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }

    /// Only a tool request keeps the loop going
    pub fn requests_tools(&self) -> bool {
        matches!(self, StopReason::ToolUse)
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The assistant turn
    pub turn: Turn,

    /// Finish reason
    pub stop_reason: StopReason,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Produce one assistant turn for the conversation.
    ///
    /// `turns` must satisfy [`validate_request`]. One network call, no retry.
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolContract],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// A request must be non-empty and must not end in an assistant turn.
pub fn validate_request(turns: &[Turn]) -> Result<()> {
    match turns.last() {
        None => Err(AgentError::InvalidConversation("conversation is empty".into())),
        Some(turn) if turn.role() == Role::Assistant => Err(AgentError::InvalidConversation(
            "conversation must not end with an assistant turn".into(),
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ContentBlock;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.max_tokens, 1024);
        assert_eq!(opts.model, DEFAULT_MODEL);
        assert!(opts.temperature.is_none());
    }

    #[test]
    fn stop_reason_wire_values() {
        assert_eq!(StopReason::from_wire("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("refusal"), StopReason::Other("refusal".into()));
        assert!(StopReason::ToolUse.requests_tools());
        assert!(!StopReason::MaxTokens.requests_tools());
    }

    #[test]
    fn request_must_not_end_with_assistant() {
        assert!(validate_request(&[]).is_err());
        assert!(validate_request(&[Turn::user("hi")]).is_ok());
        let turns = [Turn::user("hi"), Turn::assistant(vec![ContentBlock::text("hello")])];
        assert!(matches!(
            validate_request(&turns),
            Err(AgentError::InvalidConversation(_))
        ));
    }
}
