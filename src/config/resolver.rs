//! Precedence resolution for workspace settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags and their environment variables (`LORE_ROOT`, `LORE_HOST`, `LORE_PORT`)
//! 2. Project config (`<root>/lorebook.kdl`)
//! 3. System config (`~/.config/lorebook/config.kdl`, or `LORE_SYSTEM_CONFIG`)
//! 4. Built-in defaults

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::LoreConfig;

/// Environment variable that replaces the system config path.
pub const SYSTEM_CONFIG_ENV: &str = "LORE_SYSTEM_CONFIG";

/// File name of the project config inside the root.
pub const PROJECT_CONFIG_FILE: &str = "lorebook.kdl";

pub const DEFAULT_DOCS_DIR: &str = "docs";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_RENDERER: &str = "mmdc";
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Value from a CLI flag or its environment variable
    Cli,
    /// Value from the project's lorebook.kdl
    Project,
    /// Value from the system config.kdl
    System,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Cli => write!(f, "cli"),
            ValueSource::Project => write!(f, "project"),
            ValueSource::System => write!(f, "system"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Pick the first value present, walking the chain from CLI down to defaults.
fn pick<T: Clone>(cli: Option<&T>, project: Option<&T>, system: Option<&T>, default: T) -> Resolved<T> {
    if let Some(v) = cli {
        Resolved::new(v.clone(), ValueSource::Cli)
    } else if let Some(v) = project {
        Resolved::new(v.clone(), ValueSource::Project)
    } else if let Some(v) = system {
        Resolved::new(v.clone(), ValueSource::System)
    } else {
        Resolved::new(default, ValueSource::Default)
    }
}

/// CLI overrides for settings resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Workspace root; the current directory when unset
    pub root: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Fully resolved workspace settings with source tracking.
///
/// Directory values are absolute: relative config entries are joined onto `root`.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub root: PathBuf,
    pub docs_dir: Resolved<PathBuf>,
    pub data_dir: Resolved<PathBuf>,
    pub uploads_dir: Resolved<PathBuf>,
    pub host: Resolved<String>,
    pub port: Resolved<u16>,
    pub renderer: Resolved<String>,
    pub image_extensions: Resolved<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<Resolved<PathBuf>>,
}

impl Settings {
    /// Defaults rooted at `root`, ignoring config files.
    pub fn with_root(root: &Path) -> Self {
        resolve_settings(
            root,
            &ConfigOverrides::default(),
            &LoreConfig::default(),
            &LoreConfig::default(),
        )
    }

    /// Resolve settings from overrides plus the project and system config files.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let root = match overrides.root {
            Some(ref root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let project = LoreConfig::read(&root.join(PROJECT_CONFIG_FILE))?;
        let system = match system_config_path() {
            Some(path) => LoreConfig::read(&path)?,
            None => LoreConfig::default(),
        };
        Ok(resolve_settings(&root, overrides, &project, &system))
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir.value
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir.value
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_ref().map(|r| r.value.as_path())
    }

    /// `host:port` for the server to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host.value, self.port.value)
    }

    /// Whether `extension` (without the dot) is an allowed image type.
    pub fn allows_image_extension(&self, extension: &str) -> bool {
        self.image_extensions
            .value
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Location of the system config file.
pub fn system_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SYSTEM_CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("lorebook").join("config.kdl"))
}

/// Merge the precedence chain into settings.
pub fn resolve_settings(
    root: &Path,
    overrides: &ConfigOverrides,
    project: &LoreConfig,
    system: &LoreConfig,
) -> Settings {
    let dir = |project: &Option<String>, system: &Option<String>, default: &str| {
        let resolved = pick(None, project.as_ref(), system.as_ref(), default.to_string());
        Resolved::new(root.join(resolved.value), resolved.source)
    };

    let log_dir = match (&project.log_dir, &system.log_dir) {
        (Some(dir), _) => Some(Resolved::new(root.join(dir), ValueSource::Project)),
        (None, Some(dir)) => Some(Resolved::new(root.join(dir), ValueSource::System)),
        (None, None) => None,
    };

    Settings {
        root: root.to_path_buf(),
        docs_dir: dir(&project.docs_dir, &system.docs_dir, DEFAULT_DOCS_DIR),
        data_dir: dir(&project.data_dir, &system.data_dir, DEFAULT_DATA_DIR),
        uploads_dir: dir(&project.uploads_dir, &system.uploads_dir, DEFAULT_UPLOADS_DIR),
        host: pick(
            overrides.host.as_ref(),
            project.host.as_ref(),
            system.host.as_ref(),
            DEFAULT_HOST.to_string(),
        ),
        port: pick(
            overrides.port.as_ref(),
            project.port.as_ref(),
            system.port.as_ref(),
            DEFAULT_PORT,
        ),
        renderer: pick(
            None,
            project.renderer.as_ref(),
            system.renderer.as_ref(),
            DEFAULT_RENDERER.to_string(),
        ),
        image_extensions: pick(
            None,
            project.image_extensions.as_ref(),
            system.image_extensions.as_ref(),
            DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        ),
        log_dir,
    }
}
