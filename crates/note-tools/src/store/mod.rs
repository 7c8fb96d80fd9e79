//! Note Store Integration
//!
//! Abstraction over the vector database that holds notes, plus the
//! Weaviate client and an in-memory store.

mod memory;
mod weaviate;

pub use memory::MemoryNoteStore;
pub use weaviate::{WeaviateConfig, WeaviateStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{NewNote, NoteId, NoteRecord};

/// Note store client trait (Strategy pattern)
///
/// Implementations own their connection for their whole lifetime; handlers
/// share one instance through an `Arc`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert one record, fields exactly as given
    async fn insert(&self, note: NewNote) -> Result<NoteId>;

    /// Hybrid keyword/similarity search returning at most `limit` records,
    /// best match first
    async fn hybrid_search(&self, query: &str, limit: usize) -> Result<Vec<NoteRecord>>;

    /// Check if the store is available
    async fn health_check(&self) -> bool;

    /// Store name
    fn name(&self) -> &str;
}
