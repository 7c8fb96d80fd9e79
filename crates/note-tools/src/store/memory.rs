//! In-Memory Note Store
//!
//! For tests and offline runs. Ranking is plain term overlap over content
//! and context, newest first on ties.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::NoteStore;
use crate::error::Result;
use crate::model::{NewNote, NoteId, NoteRecord};

/// Note store kept in process memory
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<Vec<NoteRecord>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notes
    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn score(record: &NoteRecord, query_terms: &[String]) -> usize {
    let haystack = terms(&format!("{} {}", record.content, record.context));
    query_terms
        .iter()
        .filter(|term| haystack.contains(term))
        .count()
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, note: NewNote) -> Result<NoteId> {
        let id = uuid::Uuid::new_v4().to_string();
        self.notes
            .write()
            .await
            .push(NoteRecord::from_new(id.clone(), note));
        Ok(id)
    }

    async fn hybrid_search(&self, query: &str, limit: usize) -> Result<Vec<NoteRecord>> {
        let query_terms = terms(query);
        let notes = self.notes.read().await;

        let mut ranked: Vec<(usize, &NoteRecord)> = notes
            .iter()
            .map(|note| (score(note, &query_terms), note))
            .filter(|(s, _)| query_terms.is_empty() || *s > 0)
            .collect();

        ranked.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.created_at.cmp(&a.created_at)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, note)| note.clone())
            .collect())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "MemoryNoteStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_search() {
        let store = MemoryNoteStore::new();
        let id = store.insert(NewNote::example()).await.unwrap();
        store
            .insert(NewNote::now("Buy oat milk", "Shopping list"))
            .await
            .unwrap();

        let results = store.hybrid_search("blog writing tips", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_rank() {
        let store = MemoryNoteStore::new();
        for i in 0..7 {
            store
                .insert(NewNote::now(format!("rust note {}", i), "learning"))
                .await
                .unwrap();
        }
        store
            .insert(NewNote::now("rust async learning", "learning rust async"))
            .await
            .unwrap();

        let results = store.hybrid_search("rust async", 5).await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].content, "rust async learning");
    }

    #[tokio::test]
    async fn test_no_match() {
        let store = MemoryNoteStore::new();
        store.insert(NewNote::example()).await.unwrap();
        assert!(store.hybrid_search("quantum", 5).await.unwrap().is_empty());
    }
}
