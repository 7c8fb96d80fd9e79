//! Save Note Tool
//!
//! Writes one note, stamped with the current time, to the note store.

use std::sync::Arc;
use async_trait::async_trait;
use serde::Deserialize;

use agent_core::{Tool, ToolContract, ToolError};

use super::NoteTool;
use crate::model::NewNote;
use crate::store::NoteStore;

#[derive(Debug, Deserialize)]
pub struct SaveNoteInput {
    pub content: String,
    pub context: String,
}

/// Tool for saving notes
pub struct SaveNoteTool {
    store: Arc<dyn NoteStore>,
}

impl SaveNoteTool {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveNoteTool {
    type Input = SaveNoteInput;
    type Output = bool;

    fn contract(&self) -> ToolContract {
        NoteTool::SaveNote.contract()
    }

    async fn call(&self, input: SaveNoteInput) -> Result<bool, ToolError> {
        if input.content.trim().is_empty() {
            return Err(ToolError::InvalidInput("Note content must not be empty".into()));
        }

        let id = self.store.insert(NewNote::now(input.content, input.context)).await?;
        tracing::info!(store = self.store.name(), note_id = %id, "Saved note");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryNoteStore;

    #[tokio::test]
    async fn test_save_note() {
        let store = Arc::new(MemoryNoteStore::new());
        let tool = SaveNoteTool::new(store.clone());

        let saved = tool
            .call(SaveNoteInput {
                content: "Standups moved to 10am".into(),
                context: "User mentioned a schedule change".into(),
            })
            .await
            .unwrap();

        assert!(saved);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_blank_content_rejected() {
        let store = Arc::new(MemoryNoteStore::new());
        let tool = SaveNoteTool::new(store.clone());

        let err = tool
            .call(SaveNoteInput { content: "  ".into(), context: "x".into() })
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }
}
