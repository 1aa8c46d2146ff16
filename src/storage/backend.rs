//! Record backend trait and implementations.
//!
//! This module provides the backends for the JSON-array collections:
//! - `FileBackend` - One pretty-printed JSON array per collection (default)
//! - `MemoryBackend` - In-process arrays, used by tests

use crate::models::{Collection, Record};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for backends that persist whole collections.
///
/// A collection is always loaded and written back as a unit; there is no
/// partial update.
pub trait RecordBackend: Send + Sync {
    /// Create whatever the backend needs for every collection to be loadable.
    fn init(&mut self) -> Result<()>;

    /// Load a collection. A collection that was never written is empty.
    fn load(&self, collection: Collection) -> Result<Vec<Record>>;

    /// Replace a collection's contents.
    fn persist(&mut self, collection: Collection, records: &[Record]) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// Collections stored as `<data_dir>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }
}

/// Keep the object elements of a JSON array, warning about the rest.
fn records_from_value(value: Value, path: &Path) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidInput(format!(
            "{} does not contain a JSON array",
            path.display()
        )));
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(record) => Some(record),
            _ => {
                tracing::warn!(path = %path.display(), index, "Skipping non-object record");
                None
            }
        })
        .collect())
}

impl RecordBackend for FileBackend {
    fn init(&mut self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        for collection in Collection::ALL {
            let path = self.path(collection);
            if !path.exists() {
                fs::write(&path, "[]")?;
            }
        }
        Ok(())
    }

    fn load(&self, collection: Collection) -> Result<Vec<Record>> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(&content)?;
        records_from_value(value, &path)
    }

    fn persist(&mut self, collection: Collection, records: &[Record]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.path(collection);
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), count = records.len(), "Persisted collection");
        Ok(())
    }

    fn location(&self) -> String {
        self.data_dir.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

/// Collections held in memory for the lifetime of the backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    collections: HashMap<Collection, Vec<Record>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordBackend for MemoryBackend {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn load(&self, collection: Collection) -> Result<Vec<Record>> {
        Ok(self.collections.get(&collection).cloned().unwrap_or_default())
    }

    fn persist(&mut self, collection: Collection, records: &[Record]) -> Result<()> {
        self.collections.insert(collection, records.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
