//! Command implementations for the Lorebook CLI and web API.
//!
//! Each command takes a [`Storage`](crate::storage::Storage) (or
//! [`Settings`](crate::config::Settings)) and returns a result
//! struct implementing [`Output`], so the CLI can print it as JSON or human
//! text and the server can send the same JSON. Commands are grouped by entity:
//! - `system` - init, config and build information
//! - `idea` - idea list / add / show
//! - `task` - task list / add / move / show
//! - `record` - JSON collections, search, dialogue export, relationship graph
//! - `docs` - PRD listing and file access
//! - `media` - image uploads and diagram rendering

mod docs;
mod idea;
mod media;
mod record;
mod system;
mod task;

pub use docs::{FileSaved, FileShow, PrdList, file_get, file_put, prd_list};
pub use idea::{IdeaList, IdeaSaved, IdeaShow, idea_add, idea_list, idea_show};
pub use media::{DiagramCreated, ImageSaved, diagram_render, image_upload};
pub use record::{
    DialogueExport, GraphOutput, RecordList, RecordSaved, RecordShow, SearchOutput,
    character_graph, dialogue_export, record_get, record_list, record_put, search,
};
pub use system::{BuildInfo, ConfigShow, InitResult, PROJECT_NAME, config_show, init};
pub use task::{TaskList, TaskMoved, TaskSaved, TaskShow, task_add, task_list, task_move, task_show};

use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Serialize to a JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Pluralize a count for human output: `1 idea`, `3 ideas`.
pub(crate) fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
