//! Stamps build metadata into the `lore` binary.
//!
//! - `LORE_BUILD_TIMESTAMP`: UTC build time, RFC 3339
//! - `LORE_GIT_COMMIT`: `git describe` of the source tree, `unknown` outside a checkout

use std::process::Command;

fn main() {
    for path in [".git/HEAD", ".git/index", ".git/refs/tags"] {
        println!("cargo:rerun-if-changed={}", path);
    }

    let built = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=LORE_BUILD_TIMESTAMP={}", built);
    println!("cargo:rustc-env=LORE_GIT_COMMIT={}", describe().as_deref().unwrap_or("unknown"));
}

fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
