//! Application State

use std::sync::Arc;

use agent_core::{LlmProvider, ToolRegistry};
use note_tools::NoteStore;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Completion provider
    pub provider: Arc<dyn LlmProvider>,

    /// Tool registry with the note tools
    pub tools: Arc<ToolRegistry>,

    /// Note store shared by the tools (kept for health checks)
    pub store: Arc<dyn NoteStore>,

    pub config: Arc<ServerConfig>,
}
