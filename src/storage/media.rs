//! Uploaded images and rendered diagrams.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::sync::LazyLock;

use super::{IMAGES_DIR, Storage, timestamp_now};
use crate::models::{Collection, ListField, Record};
use crate::{Error, Result};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("Invalid regex"));

/// Reduce a caller-supplied file name to a safe ASCII name.
///
/// Path separators and whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading/trailing `.` or `_` are stripped.
/// The result may be empty.
pub fn secure_filename(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_FILENAME_CHARS
        .replace_all(&joined, "")
        .trim_matches(['.', '_'])
        .to_string()
}

fn short_hex() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn upload_paths(file_name: &str) -> (String, String) {
    let path = format!("uploads/{}/{}", IMAGES_DIR, file_name);
    let url = format!("/{}", path);
    (path, url)
}

/// An uploaded image file.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    /// File name as sent by the client
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub description: String,
    /// Comma-separated tags
    pub tags: String,
}

/// A diagram to render and record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub diagram_type: Option<String>,
    #[serde(default)]
    pub tags: Option<ListField>,
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

impl Storage {
    /// Store an uploaded image and record it in the images collection.
    pub fn save_image(&mut self, upload: ImageUpload) -> Result<Record> {
        if upload.file_name.trim().is_empty() {
            return Err(Error::InvalidInput("No selected file".to_string()));
        }
        let original_name = secure_filename(&upload.file_name);
        let (base, extension) = match original_name.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() => (base, ext.to_lowercase()),
            _ => return Err(Error::InvalidInput("File type not allowed".to_string())),
        };
        if !self.image_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(Error::InvalidInput("File type not allowed".to_string()));
        }

        let file_name = format!("{}_{}.{}", base, short_hex(), extension);
        let dir = self.layout.images_dir();
        fs::create_dir_all(&dir)?;
        let target = dir.join(&file_name);
        fs::write(&target, &upload.bytes)?;
        tracing::debug!(path = %target.display(), bytes = upload.bytes.len(), "Stored image");

        let (path, url) = upload_paths(&file_name);
        let now = timestamp_now();
        let tags = ListField::Text(upload.tags).to_tags();
        let record = into_record(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "filename": file_name,
            "original_name": original_name,
            "path": path,
            "url": url,
            "description": upload.description,
            "tags": tags,
            "created": now,
            "modified": now,
        }));

        self.append_record(Collection::Images, record.clone())?;
        Ok(record)
    }

    /// Render a diagram to SVG and record it in the diagrams collection.
    pub fn create_diagram(&mut self, request: DiagramRequest) -> Result<Record> {
        let code = request
            .code
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("No diagram code provided".to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let name = request
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("diagram_{}", short_hex()));
        let safe_name = match secure_filename(&name) {
            safe if safe.is_empty() => "diagram".to_string(),
            safe => safe,
        };
        let file_name = format!("{}_{}.svg", safe_name, &id[..8]);

        let dir = self.layout.images_dir();
        fs::create_dir_all(&dir)?;
        let output = dir.join(&file_name);

        let mut source = tempfile::Builder::new()
            .prefix("lore-diagram-")
            .suffix(".mmd")
            .tempfile()?;
        source.write_all(code.as_bytes())?;
        source.flush()?;

        self.renderer.render(source.path(), &output)?;
        tracing::debug!(renderer = self.renderer.name(), path = %output.display(), "Rendered diagram");

        let (path, url) = upload_paths(&file_name);
        let now = timestamp_now();
        let tags = request.tags.map(|t| t.to_tags()).unwrap_or_default();
        let record = into_record(json!({
            "id": id,
            "name": name,
            "filename": file_name,
            "path": path,
            "url": url,
            "code": code,
            "type": request.diagram_type.unwrap_or_else(|| "flowchart".to_string()),
            "tags": tags,
            "created": now,
            "modified": now,
        }));

        self.append_record(Collection::Diagrams, record.clone())?;
        Ok(record)
    }
}
