//! KDL schema for `lorebook.kdl` and the system `config.kdl`.
//!
//! Both files share one schema:
//!
//! ```kdl
//! docs-dir "docs"
//! data-dir "data"
//! uploads-dir "uploads"
//! host "127.0.0.1"
//! port 5000
//! renderer "mmdc"
//! image-extensions "png" "jpg" "jpeg" "gif" "svg"
//! log-dir "logs"
//! ```
//!
//! Every key is optional; unset keys fall through to the next level of the
//! precedence chain (see [`super::resolver`]).

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Settings as written in one config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreConfig {
    pub docs_dir: Option<String>,
    pub data_dir: Option<String>,
    pub uploads_dir: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Diagram renderer command
    pub renderer: Option<String>,
    /// Allowed image upload extensions, without dots
    pub image_extensions: Option<Vec<String>>,
    pub log_dir: Option<String>,
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    let node = doc.get(name)?;
    let entry = node.entries().first()?;
    entry.value().as_string().map(str::to_string)
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl LoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == Some(0) {
            return Err("port must be between 1 and 65535".to_string());
        }
        for (key, value) in [
            ("docs-dir", &self.docs_dir),
            ("data-dir", &self.data_dir),
            ("uploads-dir", &self.uploads_dir),
            ("host", &self.host),
            ("renderer", &self.renderer),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(format!("{} must not be empty", key));
            }
        }
        if let Some(ref extensions) = self.image_extensions {
            if extensions.is_empty() {
                return Err("image-extensions must list at least one extension".to_string());
            }
            if let Some(bad) = extensions
                .iter()
                .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
            {
                return Err(format!("invalid image extension: {:?}", bad));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes are ignored. An out-of-range port is an error.
    pub fn from_kdl(doc: &KdlDocument) -> std::result::Result<Self, String> {
        let mut config = Self::new();

        config.docs_dir = first_string(doc, "docs-dir");
        config.data_dir = first_string(doc, "data-dir");
        config.uploads_dir = first_string(doc, "uploads-dir");
        config.host = first_string(doc, "host");
        config.renderer = first_string(doc, "renderer");
        config.log_dir = first_string(doc, "log-dir");

        if let Some(node) = doc.get("port") {
            if let Some(entry) = node.entries().first() {
                let port = entry
                    .value()
                    .as_integer()
                    .and_then(|i| u16::try_from(i).ok())
                    .ok_or_else(|| format!("port must be an integer 1-65535, got {}", entry.value()))?;
                config.port = Some(port);
            }
        }

        if let Some(node) = doc.get("image-extensions") {
            let extensions = node
                .entries()
                .iter()
                .filter_map(|entry| entry.value().as_string())
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect();
            config.image_extensions = Some(extensions);
        }

        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        for (name, value) in [
            ("docs-dir", &self.docs_dir),
            ("data-dir", &self.data_dir),
            ("uploads-dir", &self.uploads_dir),
            ("host", &self.host),
        ] {
            if let Some(value) = value {
                doc.nodes_mut().push(string_node(name, value));
            }
        }

        if let Some(port) = self.port {
            let mut node = KdlNode::new("port");
            node.push(KdlEntry::new(KdlValue::Integer(port as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(ref renderer) = self.renderer {
            doc.nodes_mut().push(string_node("renderer", renderer));
        }

        if let Some(ref extensions) = self.image_extensions {
            let mut node = KdlNode::new("image-extensions");
            for ext in extensions {
                node.push(KdlEntry::new(KdlValue::String(ext.clone())));
            }
            doc.nodes_mut().push(node);
        }

        if let Some(ref log_dir) = self.log_dir {
            doc.nodes_mut().push(string_node("log-dir", log_dir));
        }

        doc
    }

    /// Read a config file. A missing file is an empty config.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;
        let config = Self::from_kdl(&doc)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Write the config file, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_kdl().to_string())?;
        Ok(())
    }
}
