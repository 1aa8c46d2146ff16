//! Diagram rendering through an external command.

use std::path::Path;
use std::process::Command;

use crate::{Error, Result};

/// Turns a diagram source file into an image file.
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, source: &Path, output: &Path) -> Result<()>;

    /// Program or description shown in logs.
    fn name(&self) -> &str;
}

/// Renders by running `<program> -i <source> -o <output> -b transparent`,
/// the mermaid-cli calling convention.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DiagramRenderer for CommandRenderer {
    fn render(&self, source: &Path, output: &Path) -> Result<()> {
        tracing::debug!(program = %self.program, source = %source.display(), output = %output.display(), "Rendering diagram");

        let result = Command::new(&self.program)
            .arg("-i")
            .arg(source)
            .arg("-o")
            .arg(output)
            .args(["-b", "transparent"])
            .output()
            .map_err(|e| Error::ExternalTool(format!("Failed to run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::error!(program = %self.program, status = %result.status, stderr = %stderr, "Diagram renderer failed");
            let detail = if stderr.is_empty() {
                format!("{} exited with {}", self.program, result.status)
            } else {
                stderr
            };
            return Err(Error::ExternalTool(detail));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
