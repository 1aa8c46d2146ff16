//! Storage layer for Lorebook data.
//!
//! A workspace has three directories, resolved from [`Settings`]:
//!
//! - **docs**: markdown files (`Ideas/<category>/`, `Tasks/<status>/`, `PRD/`)
//!   plus anything else reachable through file access
//! - **data**: one JSON array per [`Collection`]
//! - **uploads**: uploaded images and rendered diagrams (`images/`)
//!
//! Markdown records always live on disk. JSON collections go through a
//! [`RecordBackend`]: the file backend by default, the memory backend in tests.

pub mod backend;
mod docs;
mod media;
pub mod records;

pub use backend::{FileBackend, MemoryBackend, RecordBackend};
pub use docs::TaskMove;
pub use media::{DiagramRequest, ImageUpload, secure_filename};
pub use records::{RelationshipGraph, StoryCollections, TIMESTAMP_FORMAT, Upserted, timestamp_now};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Settings;
use crate::models::{Collection, IdeaCategory, Record, SearchResults, TaskStatus};
use crate::render::{CommandRenderer, DiagramRenderer};
use crate::{Error, Result};

pub const IDEAS_DIR: &str = "Ideas";
pub const TASKS_DIR: &str = "Tasks";
pub const PRD_DIR: &str = "PRD";
pub const IMAGES_DIR: &str = "images";

/// On-disk layout of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub docs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

impl Layout {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            docs_dir: settings.docs_dir().to_path_buf(),
            data_dir: settings.data_dir().to_path_buf(),
            uploads_dir: settings.uploads_dir().to_path_buf(),
        }
    }

    pub fn ideas_dir(&self) -> PathBuf {
        self.docs_dir.join(IDEAS_DIR)
    }

    pub fn category_dir(&self, category: IdeaCategory) -> PathBuf {
        self.ideas_dir().join(category.as_str())
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.docs_dir.join(TASKS_DIR)
    }

    pub fn status_dir(&self, status: &TaskStatus) -> PathBuf {
        self.tasks_dir().join(status.as_str())
    }

    pub fn prd_dir(&self) -> PathBuf {
        self.docs_dir.join(PRD_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.uploads_dir.join(IMAGES_DIR)
    }
}

/// A docs file read through file access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Normalized path relative to the docs directory
    pub path: String,
    pub content: String,
    /// Rendered preview, for `.md` files only
    pub html_content: Option<String>,
}

/// Storage manager for a single workspace.
pub struct Storage {
    layout: Layout,
    backend: Box<dyn RecordBackend>,
    renderer: Box<dyn DiagramRenderer>,
    image_extensions: Vec<String>,
}

impl Storage {
    /// Open file-backed storage. Nothing is created on disk.
    pub fn open(settings: &Settings) -> Self {
        let backend = FileBackend::new(settings.data_dir());
        Self::with_backend(settings, Box::new(backend))
    }

    /// Open file-backed storage and create the directory layout.
    pub fn init(settings: &Settings) -> Result<Self> {
        let mut storage = Self::open(settings);
        storage.ensure_dirs()?;
        storage.backend.init()?;
        Ok(storage)
    }

    /// Open storage with a specific record backend.
    pub fn with_backend(settings: &Settings, backend: Box<dyn RecordBackend>) -> Self {
        Self {
            layout: Layout::from_settings(settings),
            backend,
            renderer: Box::new(CommandRenderer::new(settings.renderer.value.clone())),
            image_extensions: settings.image_extensions.value.clone(),
        }
    }

    /// Replace the diagram renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn DiagramRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Record backend location (for display purposes).
    pub fn backend_location(&self) -> String {
        self.backend.location()
    }

    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }

    /// Create every category and status folder plus the PRD, data and image folders.
    pub fn ensure_dirs(&self) -> Result<()> {
        for category in IdeaCategory::ALL {
            fs::create_dir_all(self.layout.category_dir(category))?;
        }
        for status in &TaskStatus::STANDARD {
            fs::create_dir_all(self.layout.status_dir(status))?;
        }
        fs::create_dir_all(self.layout.prd_dir())?;
        fs::create_dir_all(&self.layout.data_dir)?;
        fs::create_dir_all(self.layout.images_dir())?;
        Ok(())
    }

    // ==================== JSON Records ====================

    /// All records of a collection, in stored order.
    pub fn list_records(&self, collection: Collection) -> Result<Vec<Record>> {
        self.backend.load(collection)
    }

    /// One record by id.
    pub fn get_record(&self, collection: Collection, id: &str) -> Result<Record> {
        let records = self.backend.load(collection)?;
        records::find(&records, id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} record not found: {}", collection, id)))
    }

    /// Insert or replace a record; see [`records::upsert`].
    pub fn upsert_record(&mut self, collection: Collection, incoming: Value) -> Result<Upserted> {
        let Value::Object(incoming) = incoming else {
            return Err(Error::InvalidInput(format!(
                "{} record must be a JSON object",
                collection
            )));
        };
        let mut records = self.backend.load(collection)?;
        let result = records::upsert(&mut records, incoming, &timestamp_now());
        self.backend.persist(collection, &records)?;
        tracing::debug!(%collection, id = %result.id, created = result.created, "Upserted record");
        Ok(result)
    }

    /// Append a record as-is.
    fn append_record(&mut self, collection: Collection, record: Record) -> Result<()> {
        let mut records = self.backend.load(collection)?;
        records.push(record);
        self.backend.persist(collection, &records)
    }

    /// Search story elements. An empty query is rejected.
    pub fn search(&self, query: &str) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query not provided".to_string()));
        }
        let characters = self.backend.load(Collection::Characters)?;
        let locations = self.backend.load(Collection::Locations)?;
        let quests = self.backend.load(Collection::Quests)?;
        let dialogues = self.backend.load(Collection::Dialogues)?;
        let story_arcs = self.backend.load(Collection::StoryArcs)?;

        Ok(records::search(
            query,
            StoryCollections {
                characters: &characters,
                locations: &locations,
                quests: &quests,
                dialogues: &dialogues,
                story_arcs: &story_arcs,
            },
        ))
    }

    /// Engine export of one dialogue.
    pub fn export_dialogue(&self, id: &str) -> Result<Value> {
        let dialogue = self
            .get_record(Collection::Dialogues, id)
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound("Dialogue not found".to_string()),
                other => other,
            })?;
        Ok(records::export_dialogue(&dialogue, &timestamp_now()))
    }

    pub fn relationship_graph(&self) -> Result<RelationshipGraph> {
        let characters = self.backend.load(Collection::Characters)?;
        Ok(records::relationship_graph(&characters))
    }

    // ==================== File Access ====================

    fn docs_path(&self, relative: &str) -> Result<(PathBuf, String)> {
        let normalized = normalize_relative_path(relative)?;
        let display = path_to_slash(&normalized);
        Ok((self.layout.docs_dir.join(normalized), display))
    }

    /// Read a file under the docs directory.
    pub fn read_file(&self, relative: &str) -> Result<FileContent> {
        let (path, display) = self.docs_path(relative)?;
        if !path.is_file() {
            return Err(Error::NotFound("File not found".to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let html_content = is_markdown(&path).then(|| crate::markdown::to_html(&content));
        tracing::debug!(path = %path.display(), "Read docs file");
        Ok(FileContent {
            path: display,
            content,
            html_content,
        })
    }

    /// Write a file under the docs directory, creating parent folders.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let (path, _) = self.docs_path(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote docs file");
        Ok(path)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Lexically normalize a caller-supplied relative path.
///
/// `.` segments vanish and `..` pops the previous segment. Absolute paths,
/// empty paths and paths that climb above their starting point are rejected.
pub fn normalize_relative_path(relative: &str) -> Result<PathBuf> {
    let invalid = || Error::InvalidInput(format!("Invalid file path: {}", relative));
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(invalid());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(invalid()),
        }
    }

    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.iter().collect())
}

/// Render a relative path with `/` separators.
pub(crate) fn path_to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// File creation and modification times. Creation falls back to modification
/// on filesystems that do not record it.
pub(crate) fn file_times(path: &Path) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let metadata = fs::metadata(path)?;
    let modified: DateTime<Utc> = metadata.modified()?.into();
    let created = metadata
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified);
    Ok((created, modified))
}
