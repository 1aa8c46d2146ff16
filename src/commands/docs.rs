//! PRD listing and direct file access under the docs directory.

use serde::Serialize;
use std::path::PathBuf;

use super::{Output, counted};
use crate::Result;
use crate::models::PrdDoc;
use crate::storage::Storage;

#[derive(Debug, Serialize)]
pub struct PrdList {
    pub success: bool,
    pub count: usize,
    pub documents: Vec<PrdDoc>,
}

impl Output for PrdList {
    fn to_human(&self) -> String {
        if self.documents.is_empty() {
            return "No PRD documents found.".to_string();
        }
        let mut lines = vec![format!("{}:", counted(self.count, "PRD document"))];
        for doc in &self.documents {
            lines.push(format!("  {} ({})", doc.title, doc.path));
            if !doc.summary.is_empty() {
                lines.push(format!("    {}", doc.summary));
            }
        }
        lines.join("\n")
    }
}

/// PRD documents, most recently modified first.
pub fn prd_list(storage: &Storage) -> Result<PrdList> {
    let documents = storage.list_prd_docs()?;
    Ok(PrdList {
        success: true,
        count: documents.len(),
        documents,
    })
}

#[derive(Debug, Serialize)]
pub struct FileShow {
    pub success: bool,
    pub path: String,
    pub content: String,
    pub html_content: Option<String>,
}

impl Output for FileShow {
    fn to_human(&self) -> String {
        self.content.clone()
    }
}

/// Read a file relative to the docs directory.
pub fn file_get(storage: &Storage, path: &str) -> Result<FileShow> {
    let file = storage.read_file(path)?;
    Ok(FileShow {
        success: true,
        path: file.path,
        content: file.content,
        html_content: file.html_content,
    })
}

#[derive(Debug, Serialize)]
pub struct FileSaved {
    pub success: bool,
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(skip)]
    pub bytes: usize,
}

impl Output for FileSaved {
    fn to_human(&self) -> String {
        format!("Wrote {} ({} bytes)", self.path.display(), self.bytes)
    }
}

/// Write a file relative to the docs directory, creating parent folders.
pub fn file_put(storage: &Storage, path: &str, content: &str) -> Result<FileSaved> {
    let written = storage.write_file(path, content)?;
    Ok(FileSaved {
        success: true,
        path: written,
        bytes: content.len(),
    })
}
