//! Search Notes Tool
//!
//! Hybrid search over stored notes, top matches first.

use std::sync::Arc;
use async_trait::async_trait;
use serde::Deserialize;

use agent_core::{Tool, ToolContract, ToolError};

use super::NoteTool;
use crate::model::NoteRecord;
use crate::store::NoteStore;

/// Records returned per search
pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SearchNotesInput {
    pub query: String,
}

/// Tool for searching notes
pub struct SearchNotesTool {
    store: Arc<dyn NoteStore>,
}

impl SearchNotesTool {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchNotesTool {
    type Input = SearchNotesInput;
    type Output = Vec<NoteRecord>;

    fn contract(&self) -> ToolContract {
        NoteTool::SearchNotes.contract()
    }

    async fn call(&self, input: SearchNotesInput) -> Result<Vec<NoteRecord>, ToolError> {
        let notes = self.store.hybrid_search(&input.query, SEARCH_LIMIT).await?;
        tracing::debug!(query = %input.query, hits = notes.len(), "Searched notes");
        Ok(notes)
    }
}
