//! Image upload and diagram rendering commands.

use serde::Serialize;
use serde_json::Value;

use super::Output;
use crate::Result;
use crate::models::Record;
use crate::storage::{DiagramRequest, ImageUpload, Storage};

fn text<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

#[derive(Debug, Serialize)]
pub struct ImageSaved {
    pub success: bool,
    pub image: Record,
}

impl Output for ImageSaved {
    fn to_human(&self) -> String {
        format!(
            "Stored image {} at {}",
            text(&self.image, "filename"),
            text(&self.image, "url")
        )
    }
}

pub fn image_upload(storage: &mut Storage, upload: ImageUpload) -> Result<ImageSaved> {
    Ok(ImageSaved {
        success: true,
        image: storage.save_image(upload)?,
    })
}

#[derive(Debug, Serialize)]
pub struct DiagramCreated {
    pub success: bool,
    pub diagram: Record,
}

impl Output for DiagramCreated {
    fn to_human(&self) -> String {
        format!(
            "Rendered diagram \"{}\" ({})\n  {}",
            text(&self.diagram, "name"),
            text(&self.diagram, "id"),
            text(&self.diagram, "path")
        )
    }
}

/// Render mermaid source to SVG and record the diagram.
pub fn diagram_render(storage: &mut Storage, request: DiagramRequest) -> Result<DiagramCreated> {
    Ok(DiagramCreated {
        success: true,
        diagram: storage.create_diagram(request)?,
    })
}
