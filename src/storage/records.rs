//! Operations over loaded JSON-array collections.
//!
//! Everything here works on in-memory `Vec<Record>`s; loading and persisting
//! is the backend's job (see [`super::backend`]).

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::{Record, SearchResults};

/// Timestamp format of `created` / `modified` on JSON records (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upserted {
    pub id: String,
    /// False when an existing record was replaced
    pub created: bool,
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Insert or replace `incoming` in `records`.
///
/// An `id` matching an existing record replaces that record whole; its
/// `created` carries over and `modified` is set to `now`. Any other record,
/// including one with an unknown or non-string `id`, gets a fresh UUID and
/// `created` = `modified` = `now`.
pub fn upsert(records: &mut Vec<Record>, mut incoming: Record, now: &str) -> Upserted {
    let position = record_id(&incoming)
        .and_then(|id| records.iter().position(|r| record_id(r) == Some(id)));

    match position {
        Some(index) => {
            let id = record_id(&incoming).unwrap_or_default().to_string();
            match records[index].get("created").cloned() {
                Some(created) => {
                    incoming.insert("created".to_string(), created);
                }
                None => {
                    incoming.remove("created");
                }
            }
            incoming.insert("modified".to_string(), Value::from(now));
            records[index] = incoming;
            Upserted { id, created: false }
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            incoming.insert("id".to_string(), Value::from(id.as_str()));
            incoming.insert("created".to_string(), Value::from(now));
            incoming.insert("modified".to_string(), Value::from(now));
            records.push(incoming);
            Upserted { id, created: true }
        }
    }
}

/// Find a record by id.
pub fn find<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| record_id(r) == Some(id))
}

fn field_contains(record: &Record, field: &str, needle: &str) -> bool {
    record
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|text| text.to_lowercase().contains(needle))
}

fn matches_any(record: &Record, fields: &[&str], needle: &str) -> bool {
    fields.iter().any(|field| field_contains(record, field, needle))
}

fn dialogue_matches(dialogue: &Record, needle: &str) -> bool {
    if field_contains(dialogue, "title", needle) {
        return true;
    }
    dialogue
        .get("nodes")
        .and_then(Value::as_array)
        .is_some_and(|nodes| {
            nodes
                .iter()
                .filter_map(Value::as_object)
                .any(|node| field_contains(node, "text", needle))
        })
}

/// The collections searched by [`search`].
#[derive(Debug, Clone, Copy)]
pub struct StoryCollections<'a> {
    pub characters: &'a [Record],
    pub locations: &'a [Record],
    pub quests: &'a [Record],
    pub dialogues: &'a [Record],
    pub story_arcs: &'a [Record],
}

/// Case-insensitive substring search over story elements.
///
/// `query` must already be known non-empty.
pub fn search(query: &str, stores: StoryCollections<'_>) -> SearchResults {
    let needle = query.to_lowercase();
    let filter = |records: &[Record], fields: &[&str]| -> Vec<Record> {
        records
            .iter()
            .filter(|r| matches_any(r, fields, &needle))
            .cloned()
            .collect()
    };

    SearchResults {
        characters: filter(stores.characters, &["name", "description", "background"]),
        locations: filter(stores.locations, &["name", "description"]),
        quests: filter(stores.quests, &["title", "description"]),
        dialogues: stores
            .dialogues
            .iter()
            .filter(|d| dialogue_matches(d, &needle))
            .cloned()
            .collect(),
        story_arcs: filter(stores.story_arcs, &["title", "description"]),
    }
}

fn get_or(record: &Record, key: &str, default: Value) -> Value {
    record.get(key).cloned().unwrap_or(default)
}

/// Engine-facing export of one dialogue.
pub fn export_dialogue(dialogue: &Record, exported_at: &str) -> Value {
    json!({
        "dialogueId": get_or(dialogue, "id", Value::Null),
        "title": get_or(dialogue, "title", Value::from("Untitled Dialogue")),
        "nodes": get_or(dialogue, "nodes", json!([])),
        "connections": get_or(dialogue, "connections", json!([])),
        "metadata": {
            "characters": get_or(dialogue, "characters", json!([])),
            "location": get_or(dialogue, "location", Value::Null),
            "conditions": get_or(dialogue, "conditions", json!([])),
            "variables": get_or(dialogue, "variables", Value::Object(Map::new())),
        },
        "exportedAt": exported_at,
    })
}

/// Character relationship graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<Value>,
    pub edges: Vec<Value>,
}

/// Build the relationship graph: one node per character, one edge per
/// relationship entry that names both `targetId` and `type`.
pub fn relationship_graph(characters: &[Record]) -> RelationshipGraph {
    let mut graph = RelationshipGraph::default();

    for character in characters {
        let id = get_or(character, "id", Value::Null);
        graph.nodes.push(json!({
            "id": id,
            "name": get_or(character, "name", Value::from("Unnamed Character")),
            "group": get_or(character, "faction", Value::from("Unknown")),
            "importance": get_or(character, "importance", Value::from(1)),
        }));

        let Some(relationships) = character.get("relationships").and_then(Value::as_array) else {
            continue;
        };
        for relationship in relationships.iter().filter_map(Value::as_object) {
            let (Some(target), Some(kind)) = (relationship.get("targetId"), relationship.get("type"))
            else {
                continue;
            };
            graph.edges.push(json!({
                "source": id,
                "target": target,
                "type": kind,
                "strength": get_or(relationship, "strength", Value::from(1)),
            }));
        }
    }

    graph
}
