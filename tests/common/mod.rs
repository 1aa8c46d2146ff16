//! Common test utilities for lorebook integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/lorebook/config.kdl`.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated workspace.
///
/// Each `TestEnv` creates two temporary directories:
/// - `root_dir`: The workspace root (passed via `LORE_ROOT`)
/// - `config_dir`: Holds the system config (via `LORE_SYSTEM_CONFIG`)
///
/// The `lore()` method sets both per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub root_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            root_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and run `lore init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.lore().arg("init").assert().success();
        env
    }

    /// Get a Command for the lore binary rooted in this environment.
    pub fn lore(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lore"));
        cmd.current_dir(self.root_dir.path());
        cmd.env("LORE_ROOT", self.root_dir.path());
        cmd.env("LORE_SYSTEM_CONFIG", self.system_config_path());
        cmd.env("LORE_LOG", "warn");
        cmd.env_remove("LORE_HOST");
        cmd.env_remove("LORE_PORT");
        cmd
    }

    /// Get the path to the workspace root.
    pub fn path(&self) -> &std::path::Path {
        self.root_dir.path()
    }

    /// Path of the (usually absent) system config file.
    pub fn system_config_path(&self) -> std::path::PathBuf {
        self.config_dir.path().join("config.kdl")
    }

    /// Path of a file inside the docs directory.
    pub fn docs_path(&self, relative: &str) -> std::path::PathBuf {
        self.root_dir.path().join("docs").join(relative)
    }

    /// Run a command and parse its stdout as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.lore().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "lore {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
