//! Conversation Turns
//!
//! Turn and content-block model threaded through every completion call.
//! A turn is immutable once built; a [`Conversation`] only ever grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Role of a turn's author
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Results of the tool calls requested by the preceding assistant turn
    ToolResult,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, unique within the conversation
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Structured input, expected to match the tool's schema
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// What a handler produced for one call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// JSON-serializable handler output
    Success(serde_json::Value),
    /// Error indicator shown to the model
    Error(String),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error(_))
    }

    /// Payload as it is sent back to the completion service
    pub fn to_payload_string(&self) -> String {
        match self {
            ToolOutcome::Success(value) => value.to_string(),
            ToolOutcome::Error(message) => message.clone(),
        }
    }
}

/// Result answering exactly one earlier [`ToolCall`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// Identifier of the call this answers
    pub call_id: String,

    pub outcome: ToolOutcome,
}

/// One semantic unit inside a turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolCall(ToolCall),
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_result(call_id: impl Into<String>, outcome: ToolOutcome) -> Self {
        ContentBlock::ToolResult(ToolResultBlock {
            call_id: call_id.into(),
            outcome,
        })
    }
}

/// A single turn in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: Vec<ContentBlock>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn from its blocks
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a plain-text user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant turn
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a turn carrying tool results
    pub fn tool_results(results: Vec<ToolResultBlock>) -> Self {
        Self::new(
            Role::ToolResult,
            results.into_iter().map(ContentBlock::ToolResult).collect(),
        )
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Text blocks joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool calls in the order they appear
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    /// Tool results in the order they appear
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolResultBlock> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolResult(result) => Some(result),
            _ => None,
        })
    }
}

/// Append-only conversation state for one top-level request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Seed a conversation with the initiating user turn
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(user_text)],
        }
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Text of the most recent assistant turn
    pub fn final_text(&self) -> Option<String> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(Turn::text)
    }

    /// Check that `results` answers the trailing assistant turn one-to-one,
    /// in call order.
    pub fn check_tool_results(&self, results: &Turn) -> Result<()> {
        let Some(assistant) = self.last().filter(|t| t.role == Role::Assistant) else {
            return Err(AgentError::InvalidConversation(
                "tool results must follow an assistant turn".into(),
            ));
        };

        let call_ids: Vec<&str> = assistant.tool_calls().map(|c| c.id.as_str()).collect();
        let result_ids: Vec<&str> = results
            .tool_results_iter()
            .map(|r| r.call_id.as_str())
            .collect();

        if results.role != Role::ToolResult || result_ids.len() != results.content.len() {
            return Err(AgentError::InvalidConversation(
                "tool result turn may only carry tool_result blocks".into(),
            ));
        }

        if call_ids != result_ids {
            return Err(AgentError::InvalidConversation(format!(
                "tool results {:?} do not match calls {:?}",
                result_ids, call_ids
            )));
        }

        Ok(())
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
