//! Integration tests for task operations via CLI.
//!
//! These tests verify that:
//! - `lore task add` assigns `YYYY-MM-DD-NN` ids and files tasks by status
//! - `lore task move` relocates the file and keeps its name
//! - `lore task list/show` read back what was written

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn add_task(env: &TestEnv, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["task", "add"];
    full.extend_from_slice(args);
    env.json(&full)
}

fn file_name(value: &serde_json::Value) -> String {
    PathBuf::from(value["file_path"].as_str().unwrap())
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

#[test]
fn test_task_add_assigns_sequential_ids() {
    let env = TestEnv::init();

    let first = add_task(&env, &["Implement double jump"]);
    let second = add_task(&env, &["Tune jump height"]);

    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();
    assert_eq!(first_id.len(), "2024-01-01-01".len());
    assert!(first_id.ends_with("-01"));
    assert!(second_id.ends_with("-02"));
    assert_eq!(&first_id[..10], &second_id[..10]);
    assert_eq!(file_name(&first), format!("{}-implement-double-jump.md", first_id));
}

#[test]
fn test_task_add_writes_sections() {
    let env = TestEnv::init();
    let saved = add_task(
        &env,
        &[
            "Boss fight",
            "--priority",
            "High",
            "--description",
            "The first boss.",
            "--criterion",
            "Boss has three phases",
            "--criterion",
            "Music changes per phase",
        ],
    );

    let text = fs::read_to_string(saved["file_path"].as_str().unwrap()).unwrap();
    assert!(text.starts_with("# Task: Boss fight"));
    assert!(text.contains("## Basic Information"));
    assert!(text.contains("High"));
    assert!(text.contains("## Acceptance Criteria\n- Boss has three phases\n- Music changes per phase"));
    assert_eq!(saved["task"]["status"], "Backlog");
}

#[test]
fn test_task_add_with_status() {
    let env = TestEnv::init();
    let saved = add_task(&env, &["Polish UI", "--status", "in progress"]);
    assert!(saved["file_path"].as_str().unwrap().contains("/Tasks/InProgress/"));
}

#[test]
fn test_task_move_relocates_file() {
    let env = TestEnv::init();
    let saved = add_task(&env, &["Ship demo"]);
    let id = saved["id"].as_str().unwrap();
    let name = file_name(&saved);

    let moved = env.json(&["task", "move", id, "Done"]);
    assert_eq!(moved["success"], true);
    assert_eq!(file_name(&moved), name);

    assert!(env.docs_path("Tasks/Done").join(&name).is_file());
    assert!(!env.docs_path("Tasks/Backlog").join(&name).exists());

    let shown = env.json(&["task", "show", id]);
    assert_eq!(shown["status"], "Done");
}

#[test]
fn test_task_move_same_status_is_noop() {
    let env = TestEnv::init();
    let saved = add_task(&env, &["Stay put"]);
    let id = saved["id"].as_str().unwrap();

    env.lore()
        .args(["task", "move", id, "backlog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task already in this status"));
}

#[test]
fn test_task_move_unknown_id() {
    let env = TestEnv::init();

    env.lore()
        .args(["task", "move", "1999-01-01-01", "Done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task with ID 1999-01-01-01 not found"));
}

#[test]
fn test_task_list_filter() {
    let env = TestEnv::init();
    let saved = add_task(&env, &["Review art"]);
    add_task(&env, &["Other work"]);
    env.json(&["task", "move", saved["id"].as_str().unwrap(), "Review"]);

    let all = env.json(&["task", "list"]);
    assert_eq!(all["count"], 2);

    let review = env.json(&["task", "list", "--status", "Review"]);
    assert_eq!(review["count"], 1);
    assert_eq!(review["tasks"][0]["title"], "Review art");
}

#[test]
fn test_task_list_human() {
    let env = TestEnv::init();
    add_task(&env, &["Write credits", "-p", "Low"]);

    env.lore()
        .args(["task", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 task:"))
        .stdout(predicate::str::contains("[Backlog] Write credits (priority: Low)"));
}

#[test]
fn test_task_rewrite_by_id() {
    let env = TestEnv::init();
    let saved = add_task(&env, &["Draft"]);
    let id = saved["id"].as_str().unwrap();

    let rewritten = add_task(&env, &["Draft", "--id", id, "--objective", "Finish it", "--status", "NextUp"]);
    assert_eq!(rewritten["id"], id);
    assert!(rewritten["file_path"].as_str().unwrap().contains("/Tasks/NextUp/"));
    assert_eq!(env.json(&["task", "list"])["count"], 1);
    assert_eq!(env.json(&["task", "show", id])["objective"], "Finish it");
}

#[test]
fn test_hand_written_task_is_listed() {
    let env = TestEnv::init();
    fs::write(
        env.docs_path("Tasks/Backlog/2023-06-01-03-legacy.md"),
        "# Task: Legacy\n\n## Basic Information\n- **Priority**: High\n",
    )
    .unwrap();

    let shown = env.json(&["task", "show", "2023-06-01-03"]);
    assert_eq!(shown["title"], "Legacy");
    assert_eq!(shown["priority"], "High");
}

#[test]
fn test_move_finds_task_by_file_name() {
    let env = TestEnv::init();
    fs::write(
        env.docs_path("Tasks/Backlog/2026-10-19-01-wall-run.md"),
        "# Task: Wall Run\n\n## Basic Information\n- **ID**: WR-1\n",
    )
    .unwrap();
    fs::write(env.docs_path("Tasks/Backlog/ledge-2026-10-19-02.md"), "# Task: Ledge Grab\n").unwrap();

    env.json(&["task", "move", "2026-10-19-01", "Done"]);
    env.json(&["task", "move", "2026-10-19-02", "InProgress"]);

    assert!(env.docs_path("Tasks/Done/2026-10-19-01-wall-run.md").is_file());
    assert!(env.docs_path("Tasks/InProgress/ledge-2026-10-19-02.md").is_file());
    assert_eq!(env.json(&["task", "show", "2026-10-19-02"])["title"], "Ledge Grab");
}
