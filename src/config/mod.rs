//! Configuration for a Lorebook workspace.
//!
//! Settings come from KDL files at two levels:
//!
//! - Project: `<root>/lorebook.kdl`
//! - System: `~/.config/lorebook/config.kdl`
//!
//! Both accept the same keys (`docs-dir`, `data-dir`, `uploads-dir`, `host`,
//! `port`, `renderer`, `image-extensions`, `log-dir`). CLI flags override
//! both; built-in defaults fill the rest.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, PROJECT_CONFIG_FILE, Resolved, SYSTEM_CONFIG_ENV, Settings, ValueSource,
    resolve_settings, system_config_path,
};
pub use schema::LoreConfig;
