//! Note Models
//!
//! Records of the `Note` collection: `content`, `context`, `createdAt`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the collection holding notes
pub const NOTE_COLLECTION: &str = "Note";

/// Stable identifier assigned by the store
pub type NoteId = String;

/// A note about to be written
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    /// Standalone, succinct piece of information
    pub content: String,

    /// Why the note was saved
    pub context: String,

    pub created_at: DateTime<Utc>,
}

impl NewNote {
    /// Stamp a note with the current time
    pub fn now(content: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: context.into(),
            created_at: Utc::now(),
        }
    }

    /// Note inserted when a fresh collection is seeded
    pub fn example() -> Self {
        Self::now(
            "# Tips for writing effective blog posts
- Choose a clear, focused topic for each post
- Use descriptive headlines that grab attention
- Break up text with subheadings, bullet points, and short paragraphs
- Include relevant images, charts or infographics
- Write in a conversational, engaging tone
- Provide actionable takeaways for readers
- Optimize for SEO with relevant keywords
- End with a strong call-to-action",
            "User wants to improve their blog writing skills",
        )
    }
}

/// A stored note as returned by search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: NoteId,

    pub content: String,

    pub context: String,

    /// Absent on records written without a timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NoteRecord {
    pub fn from_new(id: impl Into<NoteId>, note: NewNote) -> Self {
        Self {
            id: id.into(),
            content: note.content,
            context: note.context,
            created_at: Some(note.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_store_field_names() {
        let record = NoteRecord::from_new("n1", NewNote::now("c", "x"));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], "n1");
        assert_eq!(value["content"], "c");
        assert_eq!(value["context"], "x");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn example_note_is_about_blog_writing() {
        let note = NewNote::example();
        assert!(note.content.contains("blog posts"));
        assert_eq!(note.context, "User wants to improve their blog writing skills");
    }
}
