//! Free-form JSON records and the collections that hold them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A JSON object stored as one element of a collection array.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The JSON-array collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Characters,
    Locations,
    Quests,
    Dialogues,
    StoryArcs,
    Images,
    Diagrams,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Characters,
        Collection::Locations,
        Collection::Quests,
        Collection::Dialogues,
        Collection::StoryArcs,
        Collection::Images,
        Collection::Diagrams,
    ];

    /// Name used in URLs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Characters => "characters",
            Collection::Locations => "locations",
            Collection::Quests => "quests",
            Collection::Dialogues => "dialogues",
            Collection::StoryArcs => "story-arcs",
            Collection::Images => "images",
            Collection::Diagrams => "diagrams",
        }
    }

    /// File name of the backing array inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Characters => "characters.json",
            Collection::Locations => "locations.json",
            Collection::Quests => "quests.json",
            Collection::Dialogues => "dialogues.json",
            Collection::StoryArcs => "story_arcs.json",
            Collection::Images => "images.json",
            Collection::Diagrams => "diagrams.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "characters" | "character" => Ok(Collection::Characters),
            "locations" | "location" => Ok(Collection::Locations),
            "quests" | "quest" => Ok(Collection::Quests),
            "dialogues" | "dialogue" => Ok(Collection::Dialogues),
            "story-arcs" | "story-arc" | "storyarcs" => Ok(Collection::StoryArcs),
            "images" | "image" => Ok(Collection::Images),
            "diagrams" | "diagram" => Ok(Collection::Diagrams),
            _ => Err(Error::InvalidInput(format!("Unknown collection: {}", s))),
        }
    }
}

/// Story-element search hits, one bucket per collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub characters: Vec<Record>,
    pub locations: Vec<Record>,
    pub quests: Vec<Record>,
    pub dialogues: Vec<Record>,
    #[serde(rename = "storyArcs")]
    pub story_arcs: Vec<Record>,
}

impl SearchResults {
    /// Total number of hits across buckets.
    pub fn len(&self) -> usize {
        self.characters.len()
            + self.locations.len()
            + self.quests.len()
            + self.dialogues.len()
            + self.story_arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
