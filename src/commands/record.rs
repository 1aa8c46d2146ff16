//! Commands over the JSON collections.

use serde::Serialize;
use serde_json::Value;

use super::{Output, counted};
use crate::Result;
use crate::models::{Collection, Record, SearchResults};
use crate::storage::{RelationshipGraph, Storage};

/// Display label of a record: its name, else its title, else its id.
fn record_label(record: &Record) -> String {
    ["name", "title", "id"]
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .unwrap_or("(unnamed)")
        .to_string()
}

fn record_id(record: &Record) -> &str {
    record.get("id").and_then(Value::as_str).unwrap_or("-")
}

fn pretty(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct RecordList {
    pub collection: Collection,
    pub count: usize,
    pub records: Vec<Record>,
}

impl Output for RecordList {
    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return format!("No {} found.", self.collection);
        }
        let mut lines = vec![format!("{} in {}:", counted(self.count, "record"), self.collection)];
        for record in &self.records {
            lines.push(format!("  {}  {}", record_id(record), record_label(record)));
        }
        lines.join("\n")
    }
}

pub fn record_list(storage: &Storage, collection: Collection) -> Result<RecordList> {
    let records = storage.list_records(collection)?;
    Ok(RecordList {
        collection,
        count: records.len(),
        records,
    })
}

#[derive(Debug, Serialize)]
pub struct RecordSaved {
    pub success: bool,
    pub id: String,
    /// False when an existing record was replaced
    pub created: bool,
}

impl Output for RecordSaved {
    fn to_human(&self) -> String {
        if self.created {
            format!("Created record {}", self.id)
        } else {
            format!("Updated record {}", self.id)
        }
    }
}

/// Insert or replace a record in a collection.
pub fn record_put(storage: &mut Storage, collection: Collection, record: Value) -> Result<RecordSaved> {
    let upserted = storage.upsert_record(collection, record)?;
    Ok(RecordSaved {
        success: true,
        id: upserted.id,
        created: upserted.created,
    })
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RecordShow(pub Record);

impl Output for RecordShow {
    fn to_human(&self) -> String {
        pretty(&self.0)
    }
}

pub fn record_get(storage: &Storage, collection: Collection, id: &str) -> Result<RecordShow> {
    storage.get_record(collection, id).map(RecordShow)
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub results: SearchResults,
}

impl Output for SearchOutput {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return format!("No matches for \"{}\".", self.query);
        }
        let mut lines = vec![format!("{} for \"{}\":", counted(self.count, "hit"), self.query)];
        let buckets = [
            ("Characters", &self.results.characters),
            ("Locations", &self.results.locations),
            ("Quests", &self.results.quests),
            ("Dialogues", &self.results.dialogues),
            ("Story arcs", &self.results.story_arcs),
        ];
        for (label, records) in buckets {
            if records.is_empty() {
                continue;
            }
            lines.push(format!("{}:", label));
            for record in records {
                lines.push(format!("  {}  {}", record_id(record), record_label(record)));
            }
        }
        lines.join("\n")
    }
}

/// Case-insensitive search across the story collections.
pub fn search(storage: &Storage, query: &str) -> Result<SearchOutput> {
    let results = storage.search(query)?;
    Ok(SearchOutput {
        success: true,
        query: query.trim().to_string(),
        count: results.len(),
        results,
    })
}

#[derive(Debug, Serialize)]
pub struct DialogueExport {
    pub success: bool,
    pub data: Value,
}

impl Output for DialogueExport {
    fn to_human(&self) -> String {
        pretty(&self.data)
    }
}

pub fn dialogue_export(storage: &Storage, id: &str) -> Result<DialogueExport> {
    Ok(DialogueExport {
        success: true,
        data: storage.export_dialogue(id)?,
    })
}

#[derive(Debug, Serialize)]
pub struct GraphOutput {
    pub success: bool,
    pub graph: RelationshipGraph,
}

impl Output for GraphOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{}, {}",
            counted(self.graph.nodes.len(), "character"),
            counted(self.graph.edges.len(), "relationship")
        )];
        for edge in &self.graph.edges {
            let end = |key: &str| match edge.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "?".to_string(),
            };
            lines.push(format!("  {} -[{}]-> {}", end("source"), end("type"), end("target")));
        }
        lines.join("\n")
    }
}

/// Relationship graph over all characters.
pub fn character_graph(storage: &Storage) -> Result<GraphOutput> {
    Ok(GraphOutput {
        success: true,
        graph: storage.relationship_graph()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    #[test]
    fn test_record_put_get_list() {
        let env = TestEnv::new();
        let mut storage = env.memory_storage();

        let saved = record_put(&mut storage, Collection::Quests, json!({"title": "Find the Relic"})).unwrap();
        assert!(saved.created);
        assert_eq!(saved.to_human(), format!("Created record {}", saved.id));

        let again = record_put(
            &mut storage,
            Collection::Quests,
            json!({"id": saved.id.clone(), "title": "Find the Lost Relic"}),
        )
        .unwrap();
        assert!(again.to_human().starts_with("Updated record"));

        let list = record_list(&storage, Collection::Quests).unwrap();
        assert_eq!(list.count, 1);
        assert!(list.to_human().contains("Find the Lost Relic"));

        let shown = record_get(&storage, Collection::Quests, &saved.id).unwrap();
        let json: Value = serde_json::from_str(&shown.to_json()).unwrap();
        assert_eq!(json["title"], "Find the Lost Relic");
    }

    #[test]
    fn test_empty_collection_human() {
        let env = TestEnv::new();
        let storage = env.memory_storage();
        let list = record_list(&storage, Collection::StoryArcs).unwrap();
        assert_eq!(list.to_human(), "No story-arcs found.");
    }

    #[test]
    fn test_search_output() {
        let env = TestEnv::new();
        let mut storage = env.memory_storage();
        record_put(&mut storage, Collection::Locations, json!({"name": "Dragon's Peak"})).unwrap();

        let out = search(&storage, "dragon").unwrap();
        assert_eq!(out.count, 1);
        let json: Value = serde_json::from_str(&out.to_json()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["results"]["locations"][0]["name"], "Dragon's Peak");
        assert!(json["results"]["storyArcs"].as_array().unwrap().is_empty());
        assert!(out.to_human().contains("Locations:"));

        assert_eq!(search(&storage, "").unwrap_err().to_string(), "Search query not provided");
    }

    #[test]
    fn test_character_graph_human() {
        let env = TestEnv::new();
        let mut storage = env.memory_storage();
        let b = record_put(&mut storage, Collection::Characters, json!({"name": "Bram"})).unwrap();
        record_put(
            &mut storage,
            Collection::Characters,
            json!({"name": "Aria", "relationships": [{"targetId": b.id.clone(), "type": "rival"}]}),
        )
        .unwrap();

        let graph = character_graph(&storage).unwrap();
        assert_eq!(graph.graph.nodes.len(), 2);
        assert_eq!(graph.graph.edges.len(), 1);
        let human = graph.to_human();
        assert!(human.starts_with("2 characters, 1 relationship"));
        assert!(human.contains("-[rival]->"));
    }
}
