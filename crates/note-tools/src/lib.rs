//! # note-tools
//!
//! Personal note tools for the agent loop: a `save_note` tool that writes
//! to the note store and a `search_notes` tool that runs a hybrid search
//! over it.
//!
//! ```text
//! ┌──────────────┐   save_note    ┌──────────────────────┐
//! │ ToolRegistry │───────────────▶│  NoteStore           │
//! │              │  search_notes  │  (Weaviate / memory) │
//! │              │───────────────▶│                      │
//! └──────────────┘                └──────────────────────┘
//! ```

pub mod svckit;
pub mod store;
pub mod model;
pub mod error;

pub use error::{NoteStoreError, Result};
pub use model::{NewNote, NoteId, NoteRecord, NOTE_COLLECTION};
pub use store::{MemoryNoteStore, NoteStore, WeaviateConfig, WeaviateStore};
pub use svckit::{contracts, registry, NoteTool, SEARCH_LIMIT};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{SaveNoteTool, SearchNotesTool};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn saved_note_is_found_by_search() {
        let store: Arc<dyn NoteStore> = Arc::new(MemoryNoteStore::new());
        let registry = registry(store).unwrap();

        let save = registry.resolve("save_note").unwrap();
        let saved = save
            .invoke(&json!({
                "content": "Drink water before long runs",
                "context": "User is training for a half marathon"
            }))
            .await
            .unwrap();
        assert_eq!(saved, json!(true));

        let search = registry.resolve("search_notes").unwrap();
        let found = search
            .invoke(&json!({ "query": "Drink water before long runs" }))
            .await
            .unwrap();

        let records: Vec<NoteRecord> = serde_json::from_value(found).unwrap();
        assert!(records
            .iter()
            .any(|r| r.content == "Drink water before long runs"));
        assert!(!records[0].id.is_empty());
    }

    /// Store whose backend is down
    struct OfflineStore;

    #[async_trait::async_trait]
    impl NoteStore for OfflineStore {
        async fn insert(&self, _note: NewNote) -> Result<NoteId> {
            Err(NoteStoreError::Unreachable("connection refused".into()))
        }

        async fn hybrid_search(&self, _query: &str, _limit: usize) -> Result<Vec<NoteRecord>> {
            Err(NoteStoreError::Unreachable("connection refused".into()))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_as_external_store_error() {
        let registry = registry(Arc::new(OfflineStore)).unwrap();

        let save = registry.resolve("save_note").unwrap();
        let err = save
            .invoke(&json!({
                "content": "Outline before drafting",
                "context": "User wants to improve their blog writing skills"
            }))
            .await
            .unwrap_err();

        match err {
            agent_core::ToolError::ExternalStore(message) => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected ExternalStore, got {:?}", other),
        }

        let search = registry.resolve("search_notes").unwrap();
        let err = search.invoke(&json!({ "query": "blog" })).await.unwrap_err();
        assert!(matches!(err, agent_core::ToolError::ExternalStore(_)));
    }

    #[tokio::test]
    async fn malformed_input_never_reaches_the_store() {
        let store = Arc::new(MemoryNoteStore::new());
        let registry = registry(store.clone()).unwrap();

        let save = registry.resolve("save_note").unwrap();
        let err = save.invoke(&json!({ "content": "no context" })).await.unwrap_err();

        assert!(matches!(err, agent_core::ToolError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }
}
