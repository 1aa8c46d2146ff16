//! Data models for Lorebook entities.
//!
//! This module defines the core data structures:
//! - `Idea` - A game idea filed by category, with a five-part score and tags
//! - `Task` - A development task filed by status folder
//! - `PrdDoc` - A product requirements document (read-only listing)
//! - `IdeaDraft` / `TaskDraft` - Caller input used to write ideas and tasks
//! - `Collection` / `Record` - Free-form JSON records kept in array stores

pub mod record;

pub use record::{Collection, Record, SearchResults};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Status given to ideas that do not state one.
pub const DEFAULT_IDEA_STATUS: &str = "Brainstorming";

/// Sub-score used when a caller leaves one out.
pub const DEFAULT_SUB_SCORE: i64 = 3;

/// Idea category; each one is a folder under `Ideas/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IdeaCategory {
    #[default]
    Gameplay,
    Ui,
    Graphics,
    Sound,
    Economy,
    Story,
    Technical,
    Meta,
}

impl IdeaCategory {
    /// Every category, in folder-scan order.
    pub const ALL: [IdeaCategory; 8] = [
        IdeaCategory::Gameplay,
        IdeaCategory::Ui,
        IdeaCategory::Graphics,
        IdeaCategory::Sound,
        IdeaCategory::Economy,
        IdeaCategory::Story,
        IdeaCategory::Technical,
        IdeaCategory::Meta,
    ];

    /// Folder name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaCategory::Gameplay => "Gameplay",
            IdeaCategory::Ui => "UI",
            IdeaCategory::Graphics => "Graphics",
            IdeaCategory::Sound => "Sound",
            IdeaCategory::Economy => "Economy",
            IdeaCategory::Story => "Story",
            IdeaCategory::Technical => "Technical",
            IdeaCategory::Meta => "Meta",
        }
    }
}

impl fmt::Display for IdeaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IdeaCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdeaCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Invalid idea category: {}", s)))
    }
}

impl TryFrom<String> for IdeaCategory {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IdeaCategory> for String {
    fn from(category: IdeaCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Task status; each one is a folder under `Tasks/`.
///
/// The five standard statuses are the only folders scanned when listing or
/// looking up tasks. Any other single path component is accepted as a
/// `Custom` status when moving or saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Backlog,
    NextUp,
    InProgress,
    Review,
    Done,
    Custom(String),
}

impl TaskStatus {
    /// The standard workflow, in order.
    pub const STANDARD: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::NextUp,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Folder name of the status.
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::NextUp => "NextUp",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
            TaskStatus::Custom(name) => name,
        }
    }

    /// Whether this is one of the five scanned statuses.
    pub fn is_standard(&self) -> bool {
        !matches!(self, TaskStatus::Custom(_))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match folded.as_str() {
            "backlog" => return Ok(TaskStatus::Backlog),
            "nextup" => return Ok(TaskStatus::NextUp),
            "inprogress" => return Ok(TaskStatus::InProgress),
            "review" => return Ok(TaskStatus::Review),
            "done" => return Ok(TaskStatus::Done),
            _ => {}
        }

        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
        {
            return Err(Error::InvalidInput(format!("Invalid task status: {:?}", s)));
        }
        Ok(TaskStatus::Custom(trimmed.to_string()))
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Five-part idea score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaScore {
    pub impact: i64,
    pub feasibility: i64,
    pub originality: i64,
    pub player_value: i64,
    pub alignment: i64,
    /// Total as read from the file; recomputed whenever an idea is written
    pub total: i64,
}

impl IdeaScore {
    /// Sum of the five sub-scores.
    pub fn sum(&self) -> i64 {
        self.impact + self.feasibility + self.originality + self.player_value + self.alignment
    }
}

/// An idea read from `Ideas/<category>/<slug>.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    /// Stable identifier: `<category>/<file stem>`
    pub id: String,

    pub title: String,

    pub category: IdeaCategory,

    /// Free-text status (e.g. "Brainstorming", "Approved")
    pub status: String,

    /// One-paragraph summary
    pub summary: String,

    pub score: IdeaScore,

    /// Tags in order of first appearance, without duplicates
    #[serde(default)]
    pub tags: Vec<String>,

    /// Remaining sections (description, notes, ...) by lower-cased name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, Vec<String>>,

    /// Date from the `## Created:` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<NaiveDate>,

    /// Date from the `## Last Updated:` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<NaiveDate>,

    pub file_path: PathBuf,

    /// File creation timestamp
    pub created: DateTime<Utc>,

    /// File modification timestamp
    pub modified: DateTime<Utc>,
}

impl Idea {
    /// Body text of a named section, lines joined with newlines.
    pub fn section_text(&self, name: &str) -> Option<String> {
        self.sections.get(name).map(|lines| lines.join("\n"))
    }
}

/// A development task read from `Tasks/<status>/<id>-<slug>.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier in `YYYY-MM-DD-NN` form
    pub id: String,

    pub title: String,

    /// Task type (e.g. "Feature", "Bug")
    #[serde(rename = "type")]
    pub task_type: String,

    /// Status, derived from the containing folder
    pub status: TaskStatus,

    pub estimated_time: String,

    pub milestone: String,

    pub priority: String,

    pub description: String,

    #[serde(default)]
    pub objective: String,

    #[serde(default)]
    pub acceptance_criteria: String,

    #[serde(default)]
    pub implementation_notes: String,

    #[serde(default)]
    pub dependencies: String,

    #[serde(default)]
    pub testing_plan: String,

    #[serde(default)]
    pub next_steps: String,

    pub file_path: PathBuf,

    /// File creation timestamp
    pub created: DateTime<Utc>,

    /// File modification timestamp
    pub modified: DateTime<Utc>,
}

/// A PRD document under `PRD/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrdDoc {
    /// Path relative to the PRD folder, used as identifier
    pub id: String,
    pub title: String,
    /// First paragraph after the title
    pub summary: String,
    /// Path relative to the docs folder
    pub path: String,
    pub file_path: PathBuf,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A list-valued field given either as items or as pre-formatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    Text(String),
}

impl Default for ListField {
    fn default() -> Self {
        ListField::Text(String::new())
    }
}

impl ListField {
    /// Markdown body: `- item` lines for items, text verbatim otherwise.
    pub fn render(&self) -> String {
        match self {
            ListField::Items(items) => items
                .iter()
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
            ListField::Text(text) => text.clone(),
        }
    }

    /// Interpret as tags: items as-is, text split on commas.
    pub fn to_tags(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            ListField::Items(items) => items.iter().map(String::as_str).collect(),
            ListField::Text(text) => text.split(',').collect(),
        };
        let mut tags: Vec<String> = Vec::new();
        for tag in raw {
            let tag = tag.trim().trim_start_matches('#').trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}

/// A score component that may arrive as a number or numeric text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(i64),
    Text(String),
}

/// Caller-supplied scores; missing parts default to 3 and `total` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    #[serde(default)]
    pub impact: Option<ScoreValue>,
    #[serde(default)]
    pub feasibility: Option<ScoreValue>,
    #[serde(default)]
    pub originality: Option<ScoreValue>,
    #[serde(default)]
    pub player_value: Option<ScoreValue>,
    #[serde(default)]
    pub alignment: Option<ScoreValue>,
    #[serde(default)]
    pub total: Option<ScoreValue>,
}

impl ScoreInput {
    /// Resolve into a score whose total is the sum of its parts.
    pub fn resolve(&self) -> IdeaScore {
        let part = |name: &str, value: &Option<ScoreValue>| match value {
            None => DEFAULT_SUB_SCORE,
            Some(ScoreValue::Number(n)) => *n,
            Some(ScoreValue::Text(text)) => text.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(field = name, value = %text, "Non-numeric score, using default");
                DEFAULT_SUB_SCORE
            }),
        };
        let mut score = IdeaScore {
            impact: part("impact", &self.impact),
            feasibility: part("feasibility", &self.feasibility),
            originality: part("originality", &self.originality),
            player_value: part("player_value", &self.player_value),
            alignment: part("alignment", &self.alignment),
            total: 0,
        };
        score.total = score.sum();
        score
    }
}

impl From<IdeaScore> for ScoreInput {
    fn from(score: IdeaScore) -> Self {
        Self {
            impact: Some(ScoreValue::Number(score.impact)),
            feasibility: Some(ScoreValue::Number(score.feasibility)),
            originality: Some(ScoreValue::Number(score.originality)),
            player_value: Some(ScoreValue::Number(score.player_value)),
            alignment: Some(ScoreValue::Number(score.alignment)),
            total: None,
        }
    }
}

/// Input for writing an idea file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeaDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<IdeaCategory>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<ListField>,
    #[serde(default)]
    pub tags: Option<ListField>,
    #[serde(default)]
    pub score: ScoreInput,
}

impl IdeaDraft {
    /// Draft with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn category(&self) -> IdeaCategory {
        self.category.unwrap_or_default()
    }
}

impl From<&Idea> for IdeaDraft {
    fn from(idea: &Idea) -> Self {
        Self {
            title: Some(idea.title.clone()),
            category: Some(idea.category),
            status: Some(idea.status.clone()),
            summary: Some(idea.summary.clone()),
            description: idea.section_text("description"),
            notes: idea.section_text("notes").map(ListField::Text),
            tags: Some(ListField::Items(idea.tags.clone())),
            score: idea.score.into(),
        }
    }
}

/// Input for writing a task file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Existing task id; when it matches a task file, that file is rewritten
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Option<ListField>,
    #[serde(default)]
    pub implementation_notes: Option<ListField>,
    #[serde(default)]
    pub dependencies: Option<ListField>,
    #[serde(default)]
    pub testing_plan: Option<ListField>,
    #[serde(default)]
    pub next_steps: Option<ListField>,
}

impl TaskDraft {
    /// Draft with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status.clone().unwrap_or_default()
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: Some(task.title.clone()),
            task_type: Some(task.task_type.clone()),
            status: Some(task.status.clone()),
            estimated_time: Some(task.estimated_time.clone()),
            milestone: Some(task.milestone.clone()),
            priority: Some(task.priority.clone()),
            description: Some(task.description.clone()),
            objective: Some(task.objective.clone()),
            acceptance_criteria: Some(ListField::Text(task.acceptance_criteria.clone())),
            implementation_notes: Some(ListField::Text(task.implementation_notes.clone())),
            dependencies: Some(ListField::Text(task.dependencies.clone())),
            testing_plan: Some(ListField::Text(task.testing_plan.clone())),
            next_steps: Some(ListField::Text(task.next_steps.clone())),
        }
    }
}
