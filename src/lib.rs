//! Lorebook - A local documentation and content tool for game-development teams.
//!
//! This library provides the core functionality for the `lore` CLI and its web API:
//! markdown-backed ideas, tasks and PRD documents, JSON-array stores for story
//! elements, search, and the HTTP server that exposes them.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod markdown;
pub mod models;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;


/// Library-level error type for Lorebook operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Lorebook operations.
pub type Result<T> = std::result::Result<T, Error>;
