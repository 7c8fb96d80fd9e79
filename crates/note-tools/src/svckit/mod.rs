//! Service Kit - Agent Tools
//!
//! The closed set of note tools. Each variant of [`NoteTool`] owns one
//! published contract and exactly one handler type.

mod save_note;
mod search_notes;

pub use save_note::{SaveNoteInput, SaveNoteTool};
pub use search_notes::{SearchNotesInput, SearchNotesTool, SEARCH_LIMIT};

use std::sync::Arc;

use agent_core::{ParamType, ParameterSchema, ToolContract, ToolRegistry};

use crate::store::NoteStore;

/// Every tool this crate provides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteTool {
    SaveNote,
    SearchNotes,
}

impl NoteTool {
    pub const ALL: [NoteTool; 2] = [NoteTool::SaveNote, NoteTool::SearchNotes];

    pub fn name(self) -> &'static str {
        match self {
            NoteTool::SaveNote => "save_note",
            NoteTool::SearchNotes => "search_notes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn contract(self) -> ToolContract {
        match self {
            NoteTool::SaveNote => ToolContract {
                name: self.name().into(),
                description: "Save a note to the database for future reference".into(),
                parameters: vec![
                    ParameterSchema::required(
                        "content",
                        ParamType::String,
                        "The content of the note. Should be a standalone, succinct piece of information that will make sense to the user.",
                    ),
                    ParameterSchema::required(
                        "context",
                        ParamType::String,
                        "The conversational context of the note, including why this note is being saved",
                    ),
                ],
            },
            NoteTool::SearchNotes => ToolContract {
                name: self.name().into(),
                description: "Search for notes to answer personal questions".into(),
                parameters: vec![ParameterSchema::required(
                    "query",
                    ParamType::String,
                    "The search query to use to find notes",
                )],
            },
        }
    }
}

/// Contracts for every note tool, in declaration order
pub fn contracts() -> Vec<ToolContract> {
    NoteTool::ALL.into_iter().map(NoteTool::contract).collect()
}

/// Build a registry with one handler per [`NoteTool`] variant, all sharing
/// `store`.
pub fn registry(store: Arc<dyn NoteStore>) -> agent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in NoteTool::ALL {
        match tool {
            NoteTool::SaveNote => registry.register(SaveNoteTool::new(store.clone()))?,
            NoteTool::SearchNotes => registry.register(SearchNotesTool::new(store.clone()))?,
        }
    }
    registry.verify_contracts(&contracts())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryNoteStore;

    #[test]
    fn names_round_trip() {
        for tool in NoteTool::ALL {
            assert_eq!(NoteTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(NoteTool::from_name("delete_note"), None);
    }

    #[test]
    fn registry_covers_every_tool() {
        let registry = registry(Arc::new(MemoryNoteStore::new())).unwrap();
        assert_eq!(registry.names(), ["save_note", "search_notes"]);
        assert!(registry.verify_contracts(&contracts()).is_ok());
    }

    #[test]
    fn save_note_contract_requires_both_fields() {
        let schema = NoteTool::SaveNote.contract().input_schema();
        assert_eq!(schema["required"], serde_json::json!(["content", "context"]));
    }
}
