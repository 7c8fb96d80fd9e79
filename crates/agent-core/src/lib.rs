//! # agent-core
//!
//! Provider-agnostic tool-use loop: conversation model, tool registry, and
//! the agent state machine that ties a model's tool requests to handlers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Conversation│  │    Tool     │  │   LlmProvider       │  │
//! │  │    Loop     │──│  Registry   │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop only talks to the completion service through [`LlmProvider`] and
//! to tools through [`ToolRegistry`], both injected at construction.

pub mod provider;
pub mod tool;
pub mod reasoning;
pub mod message;
pub mod error;

pub use error::{AgentError, Result, ToolError};
pub use message::{ContentBlock, Conversation, Role, ToolCall, ToolOutcome, ToolResultBlock, Turn};
pub use provider::{Completion, GenerationOptions, LlmProvider, StopReason, TokenUsage};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentRun, Transcript};
pub use tool::{ParamType, ParameterSchema, Tool, ToolContract, ToolHandler, ToolRegistry};
