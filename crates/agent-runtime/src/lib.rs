//! # agent-runtime
//!
//! Completion providers for the notes agent.
//!
//! ## Providers
//!
//! - **Anthropic** (default): Messages API with native tool use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::anthropic::AnthropicProvider;
//!
//! let provider = AnthropicProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .tools(Arc::new(registry))
//!     .build()?;
//! ```

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Result, Role, ToolRegistry, Turn,
};
