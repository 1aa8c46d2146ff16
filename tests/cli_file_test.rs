//! Integration tests for docs files, PRD listing and diagrams via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_file_put_then_get() {
    let env = TestEnv::init();

    env.lore()
        .args(["file", "put", "Story/world/intro.md", "--content", "# Intro\n\nOnce upon a time."])
        .assert()
        .success()
        .stdout(predicate::str::diff("{\"success\":true}\n"));

    assert!(env.docs_path("Story/world/intro.md").is_file());

    let file = env.json(&["file", "get", "Story/world/intro.md"]);
    assert_eq!(file["success"], true);
    assert_eq!(file["content"], "# Intro\n\nOnce upon a time.");
    assert!(file["html_content"].as_str().unwrap().contains("<h1>Intro</h1>"));
}

#[test]
fn test_file_put_from_stdin_and_human_get() {
    let env = TestEnv::init();

    env.lore()
        .args(["file", "put", "notes.txt"])
        .write_stdin("plain notes")
        .assert()
        .success();

    env.lore()
        .args(["file", "get", "notes.txt", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::diff("plain notes\n"));

    let file = env.json(&["file", "get", "notes.txt"]);
    assert!(file["html_content"].is_null());
}

#[test]
fn test_file_rejects_traversal() {
    let env = TestEnv::init();

    env.lore()
        .args(["file", "get", "../lorebook.kdl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid file path"));

    env.lore()
        .args(["file", "put", "a/../../escape.md", "--content", "x"])
        .assert()
        .failure();
    assert!(!env.path().join("escape.md").exists());
}

#[test]
fn test_file_get_missing() {
    let env = TestEnv::init();

    env.lore()
        .args(["file", "get", "nothing.md", "-H"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: File not found"));
}

#[test]
fn test_prd_list() {
    let env = TestEnv::init();
    fs::create_dir_all(env.docs_path("PRD/systems")).unwrap();
    fs::create_dir_all(env.docs_path("PRD/.drafts")).unwrap();
    fs::write(
        env.docs_path("PRD/systems/combat.md"),
        "# Combat System\n\nFast and readable\nfights.\n\n## Goals\n",
    )
    .unwrap();
    fs::write(env.docs_path("PRD/overview.md"), "No heading here.\n").unwrap();
    fs::write(env.docs_path("PRD/.drafts/secret.md"), "# Secret\n").unwrap();

    let list = env.json(&["prd", "list"]);
    assert_eq!(list["count"], 2);

    let docs = list["documents"].as_array().unwrap();
    let combat = docs.iter().find(|d| d["id"] == "systems/combat.md").unwrap();
    assert_eq!(combat["title"], "Combat System");
    assert_eq!(combat["summary"], "Fast and readable fights.");
    assert_eq!(combat["path"], "PRD/systems/combat.md");

    let overview = docs.iter().find(|d| d["id"] == "overview.md").unwrap();
    assert_eq!(overview["title"], "Overview");

    // The listed path works with file access
    let file = env.json(&["file", "get", "PRD/systems/combat.md"]);
    assert!(file["content"].as_str().unwrap().starts_with("# Combat System"));
}

#[cfg(unix)]
mod diagrams {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Install a fake renderer that copies the source to the output path.
    fn install_renderer(env: &TestEnv, script: &str) {
        let path = env.path().join("fake-mmdc.sh");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(
            env.path().join("lorebook.kdl"),
            format!("renderer \"{}\"\n", path.display()),
        )
        .unwrap();
    }

    #[test]
    fn test_diagram_render_records_diagram() {
        let env = TestEnv::init();
        install_renderer(&env, "#!/bin/sh\ncp \"$2\" \"$4\"\n");

        let saved = env
            .lore()
            .args(["diagram", "render", "--name", "Quest Flow", "--tag", "quests"])
            .write_stdin("graph TD; A-->B")
            .output()
            .unwrap();
        assert!(saved.status.success(), "{}", String::from_utf8_lossy(&saved.stderr));
        let saved: serde_json::Value = serde_json::from_slice(&saved.stdout).unwrap();
        assert_eq!(saved["diagram"]["name"], "Quest Flow");
        assert_eq!(saved["diagram"]["tags"], serde_json::json!(["quests"]));

        let file_name = saved["diagram"]["filename"].as_str().unwrap();
        assert!(file_name.starts_with("Quest_Flow_"));
        let rendered = fs::read_to_string(env.path().join("uploads/images").join(file_name)).unwrap();
        assert_eq!(rendered, "graph TD; A-->B");

        let list = env.json(&["record", "list", "diagrams"]);
        assert_eq!(list["count"], 1);
    }

    #[test]
    fn test_diagram_render_failure_reports_stderr() {
        let env = TestEnv::init();
        install_renderer(&env, "#!/bin/sh\necho 'Parse error on line 1' >&2\nexit 1\n");

        env.lore()
            .args(["diagram", "render"])
            .write_stdin("not mermaid")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Parse error on line 1"));

        let list = env.json(&["record", "list", "diagrams"]);
        assert_eq!(list["count"], 0);
    }
}
