//! Workspace initialization and configuration display.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::Output;
use crate::Result;
use crate::config::{LoreConfig, PROJECT_CONFIG_FILE, Resolved, Settings};
use crate::storage::Storage;

/// Name reported by `/api/config` and `lore config show`.
pub const PROJECT_NAME: &str = "Lorebook";

/// Build-time metadata for the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub built: String,
}

impl BuildInfo {
    /// Metadata of this crate. Commit and timestamp come from `build.rs`.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("LORE_GIT_COMMIT").unwrap_or("unknown").to_string(),
            built: option_env!("LORE_BUILD_TIMESTAMP").unwrap_or("unknown").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub root: PathBuf,
    pub docs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub config_file: PathBuf,
    /// False when a project config already existed
    pub config_created: bool,
}

impl Output for InitResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Initialized Lorebook workspace at {}", self.root.display())];
        lines.push(format!("  docs:    {}", self.docs_dir.display()));
        lines.push(format!("  data:    {}", self.data_dir.display()));
        lines.push(format!("  uploads: {}", self.uploads_dir.display()));
        if self.config_created {
            lines.push(format!("Wrote {}", self.config_file.display()));
        } else {
            lines.push(format!("Kept existing {}", self.config_file.display()));
        }
        lines.join("\n")
    }
}

/// Express `dir` relative to `root` when it lives below it.
fn relative_to(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .to_string_lossy()
        .into_owned()
}

/// Create the workspace layout and, when missing, a project config recording it.
pub fn init(settings: &Settings) -> Result<InitResult> {
    let storage = Storage::init(settings)?;
    let layout = storage.layout();

    let config_file = settings.root.join(PROJECT_CONFIG_FILE);
    let config_created = !config_file.exists();
    if config_created {
        let config = LoreConfig {
            docs_dir: Some(relative_to(&settings.root, &layout.docs_dir)),
            data_dir: Some(relative_to(&settings.root, &layout.data_dir)),
            uploads_dir: Some(relative_to(&settings.root, &layout.uploads_dir)),
            ..Default::default()
        };
        config.write(&config_file)?;
    }
    tracing::info!(root = %settings.root.display(), config_created, "Initialized workspace");

    Ok(InitResult {
        root: settings.root.clone(),
        docs_dir: layout.docs_dir.clone(),
        data_dir: layout.data_dir.clone(),
        uploads_dir: layout.uploads_dir.clone(),
        config_file,
        config_created,
    })
}

/// Project information plus every resolved setting with its source.
#[derive(Debug, Serialize)]
pub struct ConfigShow {
    pub name: &'static str,
    #[serde(flatten)]
    pub build: BuildInfo,
    pub docs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub settings: Settings,
}

fn source_line<T: std::fmt::Display>(key: &str, resolved: &Resolved<T>) -> String {
    format!("  {:<17} {} ({})", key, resolved.value, resolved.source)
}

fn path_line(key: &str, resolved: &Resolved<PathBuf>) -> String {
    format!("  {:<17} {} ({})", key, resolved.value.display(), resolved.source)
}

impl Output for ConfigShow {
    fn to_human(&self) -> String {
        let s = &self.settings;
        let mut lines = vec![
            format!("{} {} ({}, built {})", self.name, self.build.version, self.build.commit, self.build.built),
            format!("  {:<17} {}", "root", s.root.display()),
            path_line("docs-dir", &s.docs_dir),
            path_line("data-dir", &s.data_dir),
            path_line("uploads-dir", &s.uploads_dir),
            source_line("host", &s.host),
            source_line("port", &s.port),
            source_line("renderer", &s.renderer),
            format!(
                "  {:<17} {} ({})",
                "image-extensions",
                s.image_extensions.value.join(" "),
                s.image_extensions.source
            ),
        ];
        match &s.log_dir {
            Some(dir) => lines.push(path_line("log-dir", dir)),
            None => lines.push(format!("  {:<17} (unset)", "log-dir")),
        }
        lines.join("\n")
    }
}

pub fn config_show(settings: &Settings) -> ConfigShow {
    ConfigShow {
        name: PROJECT_NAME,
        build: BuildInfo::current(),
        docs_dir: settings.docs_dir().to_path_buf(),
        data_dir: settings.data_dir().to_path_buf(),
        uploads_dir: settings.uploads_dir().to_path_buf(),
        settings: settings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValueSource;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_init_writes_project_config_once() {
        let env = TestEnv::new();
        let settings = env.settings();

        let first = init(&settings).unwrap();
        assert!(first.config_created);
        assert!(first.docs_dir.join("Ideas").join("Gameplay").is_dir());

        let config = LoreConfig::read(&first.config_file).unwrap();
        assert_eq!(config.docs_dir.as_deref(), Some("docs"));
        assert_eq!(config.uploads_dir.as_deref(), Some("uploads"));

        let second = init(&settings).unwrap();
        assert!(!second.config_created);
        assert!(second.to_human().contains("Kept existing"));
    }

    #[test]
    fn test_config_show_reports_sources() {
        let env = TestEnv::new();
        let shown = config_show(&env.settings());
        assert_eq!(shown.name, "Lorebook");
        assert_eq!(shown.settings.port.source, ValueSource::Default);

        let json: serde_json::Value = serde_json::from_str(&shown.to_json()).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["settings"]["port"]["value"], 5000);
        assert_eq!(json["settings"]["port"]["source"], "default");

        let human = shown.to_human();
        assert!(human.contains("port"));
        assert!(human.contains("5000 (default)"));
        assert!(human.contains("(unset)"));
    }
}
