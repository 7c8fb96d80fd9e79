//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Everything here is fatal to the current run. Tool handler failures are
/// not part of this enum: they are caught at the dispatch boundary and fed
/// back to the model as [`ToolError`] payloads.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion service rejected the request or returned a bad response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion service unreachable
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The model asked for a tool the registry does not know.
    /// Published contracts and registered handlers have drifted apart.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Stop signal says "tool requested" but the turn carries no tool calls
    #[error("Inconsistent stop signal: {0}")]
    InconsistentStop(String),

    /// Conversation cannot be sent as a completion request
    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    /// Maximum completion calls reached in the loop
    #[error("Iteration limit ({0}) exceeded")]
    IterationLimitExceeded(usize),

    /// Run was cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Failures of the completion call itself
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            AgentError::Provider(_)
                | AgentError::ProviderUnavailable(_)
                | AgentError::RateLimited(_)
                | AgentError::Auth(_)
        )
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::Provider(_) => "COMPLETION_FAILED",
            AgentError::ProviderUnavailable(_) => "COMPLETION_UNAVAILABLE",
            AgentError::RateLimited(_) => "RATE_LIMITED",
            AgentError::Auth(_) => "AUTH_FAILED",
            AgentError::UnknownTool(_) => "UNKNOWN_TOOL",
            AgentError::InconsistentStop(_) => "INCONSISTENT_STOP",
            AgentError::InvalidConversation(_) => "INVALID_CONVERSATION",
            AgentError::IterationLimitExceeded(_) => "ITERATION_LIMIT",
            AgentError::Cancelled => "CANCELLED",
            AgentError::Config(_) => "CONFIG_ERROR",
            AgentError::Json(_) | AgentError::Other(_) => "AGENT_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            AgentError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            AgentError::Auth(_) => "Authentication with the AI service failed.".into(),
            AgentError::UnknownTool(name) => format!("The assistant asked for a tool that is not available: '{}'.", name),
            AgentError::IterationLimitExceeded(_) => "The request took too many steps to process. Please try a simpler query.".into(),
            AgentError::Cancelled => "The request was cancelled before it finished.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}

/// Failure of a single tool invocation.
///
/// Surfaced to the model as an error `tool_result` block, never propagated
/// out of the loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Input did not match the tool's declared schema
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// The tool's backing store was unreachable or refused the operation
    #[error("External store error: {0}")]
    ExternalStore(String),

    /// Any other handler failure
    #[error("Tool execution error: {0}")]
    Execution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_failures_are_classified() {
        assert!(AgentError::Provider("500".into()).is_completion_failure());
        assert!(AgentError::RateLimited("slow down".into()).is_completion_failure());
        assert!(!AgentError::UnknownTool("x".into()).is_completion_failure());
        assert!(!AgentError::IterationLimitExceeded(3).is_completion_failure());
    }

    #[test]
    fn codes_are_distinct_for_loop_failures() {
        assert_eq!(AgentError::UnknownTool("x".into()).code(), "UNKNOWN_TOOL");
        assert_eq!(AgentError::IterationLimitExceeded(3).code(), "ITERATION_LIMIT");
        assert_eq!(AgentError::Cancelled.code(), "CANCELLED");
    }
}
