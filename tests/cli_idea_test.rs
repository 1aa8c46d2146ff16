//! Integration tests for idea operations via CLI.
//!
//! These tests verify that:
//! - `lore idea add/list/show` work end to end
//! - Idea files land in their category folder with a recomputed total
//! - Hand-edited and malformed files are handled leniently

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

fn add_double_jump(env: &TestEnv) {
    env.lore()
        .args([
            "idea",
            "add",
            "Double Jump",
            "--category",
            "Gameplay",
            "--impact",
            "4",
            "--feasibility",
            "5",
            "--originality",
            "3",
            "--player-value",
            "4",
            "--alignment",
            "5",
            "--tag",
            "movement",
        ])
        .assert()
        .success();
}

#[test]
fn test_idea_add_writes_category_file() {
    let env = TestEnv::init();
    add_double_jump(&env);

    let text = fs::read_to_string(env.docs_path("Ideas/Gameplay/double-jump.md")).unwrap();
    assert!(text.starts_with("# Double Jump"));
    assert!(text.contains("- **Total Score**: 21"));
    assert!(text.contains("movement"));
}

#[test]
fn test_idea_add_json() {
    let env = TestEnv::init();

    env.lore()
        .args(["idea", "add", "Weather System", "-c", "technical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\":true"))
        .stdout(predicate::str::contains("\"id\":\"Technical/weather-system\""))
        .stdout(predicate::str::contains("\"total\":15"));
}

#[test]
fn test_idea_add_human() {
    let env = TestEnv::init();

    env.lore()
        .args(["idea", "add", "Loot Goblins", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved idea \"Loot Goblins\" (Gameplay/loot-goblins)"));
}

#[test]
fn test_idea_add_invalid_category() {
    let env = TestEnv::init();

    env.lore()
        .args(["idea", "add", "Somewhere", "-c", "Weather"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid idea category"));
}

#[test]
fn test_idea_list_sorted_by_score() {
    let env = TestEnv::init();
    add_double_jump(&env);
    env.lore()
        .args(["idea", "add", "Fishing", "--impact", "1", "--feasibility", "1"])
        .assert()
        .success();

    let list = env.json(&["idea", "list"]);
    assert_eq!(list["count"], 2);
    assert_eq!(list["ideas"][0]["title"], "Double Jump");
    assert_eq!(list["ideas"][1]["title"], "Fishing");
    assert_eq!(list["ideas"][1]["score"]["total"], 11);
}

#[test]
fn test_idea_list_empty_human() {
    let env = TestEnv::init();

    env.lore()
        .args(["idea", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No ideas found."));
}

#[test]
fn test_idea_show() {
    let env = TestEnv::init();
    add_double_jump(&env);

    let idea = env.json(&["idea", "show", "Gameplay/double-jump"]);
    assert_eq!(idea["category"], "Gameplay");
    assert_eq!(idea["status"], "Brainstorming");
    assert_eq!(idea["score"]["player_value"], 4);
    assert_eq!(idea["tags"][0], "movement");
}

#[test]
fn test_idea_show_not_found() {
    let env = TestEnv::init();

    env.lore()
        .args(["idea", "show", "Gameplay/nothing", "-H"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Idea not found: Gameplay/nothing"));
}

#[test]
fn test_list_skips_unreadable_file() {
    let env = TestEnv::init();
    add_double_jump(&env);
    fs::write(env.docs_path("Ideas/Gameplay/broken.md"), b"\xff\xfe\x00\x80").unwrap();
    fs::write(
        env.docs_path("Ideas/Gameplay/hand-written.md"),
        "# Hand Written\n\n## Summary\nWritten by hand.\n",
    )
    .unwrap();

    let list = env.json(&["idea", "list"]);
    assert_eq!(list["count"], 2);
}

#[test]
fn test_idea_resave_keeps_created_date() {
    let env = TestEnv::init();
    let path = env.docs_path("Ideas/Story/old-legend.md");
    fs::write(&path, "# Old Legend\n\n## Created: 2020-01-02\n").unwrap();

    env.lore()
        .args(["idea", "add", "Old Legend", "-c", "Story", "--summary", "Retold"])
        .assert()
        .success();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("2020-01-02"));
    assert!(text.contains("Retold"));
}
