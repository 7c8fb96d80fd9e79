//! Error Types for the Note Store

use agent_core::ToolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoteStoreError>;

#[derive(Error, Debug)]
pub enum NoteStoreError {
    #[error("Note store unreachable: {0}")]
    Unreachable(String),

    #[error("Note store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed note store response: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<NoteStoreError> for ToolError {
    fn from(err: NoteStoreError) -> Self {
        ToolError::ExternalStore(err.to_string())
    }
}
