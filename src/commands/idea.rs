//! Idea commands.

use serde::Serialize;
use std::path::PathBuf;

use super::{Output, counted};
use crate::Result;
use crate::models::{Idea, IdeaDraft};
use crate::storage::Storage;

fn score_line(idea: &Idea) -> String {
    let s = &idea.score;
    format!(
        "score {} (impact {}, feasibility {}, originality {}, player value {}, alignment {})",
        s.total, s.impact, s.feasibility, s.originality, s.player_value, s.alignment
    )
}

fn summary_line(idea: &Idea) -> String {
    format!(
        "[{:>2}] {} ({}, {})",
        idea.score.total, idea.title, idea.category, idea.status
    )
}

#[derive(Debug, Serialize)]
pub struct IdeaList {
    pub count: usize,
    pub ideas: Vec<Idea>,
}

impl Output for IdeaList {
    fn to_human(&self) -> String {
        if self.ideas.is_empty() {
            return "No ideas found.".to_string();
        }
        let mut lines = vec![format!("{}:", counted(self.count, "idea"))];
        for idea in &self.ideas {
            lines.push(format!("  {}", summary_line(idea)));
            lines.push(format!("       {}", idea.id));
        }
        lines.join("\n")
    }
}

/// All ideas, highest total score first.
pub fn idea_list(storage: &Storage) -> Result<IdeaList> {
    let ideas = storage.list_ideas()?;
    Ok(IdeaList {
        count: ideas.len(),
        ideas,
    })
}

#[derive(Debug, Serialize)]
pub struct IdeaSaved {
    pub success: bool,
    pub id: String,
    pub file_path: PathBuf,
    pub idea: Idea,
}

impl Output for IdeaSaved {
    fn to_human(&self) -> String {
        format!(
            "Saved idea \"{}\" ({})\n  {}\n  {}",
            self.idea.title,
            self.id,
            score_line(&self.idea),
            self.file_path.display()
        )
    }
}

/// Write an idea file from a draft.
pub fn idea_add(storage: &Storage, draft: &IdeaDraft) -> Result<IdeaSaved> {
    let idea = storage.save_idea(draft)?;
    Ok(IdeaSaved {
        success: true,
        id: idea.id.clone(),
        file_path: idea.file_path.clone(),
        idea,
    })
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct IdeaShow(pub Idea);

impl Output for IdeaShow {
    fn to_human(&self) -> String {
        let idea = &self.0;
        let mut lines = vec![
            format!("{} ({})", idea.title, idea.id),
            format!("  Category: {}", idea.category),
            format!("  Status:   {}", idea.status),
            format!("  {}", score_line(idea)),
        ];
        if !idea.tags.is_empty() {
            lines.push(format!("  Tags:     {}", idea.tags.join(", ")));
        }
        if !idea.summary.is_empty() {
            lines.push(String::new());
            lines.push(idea.summary.clone());
        }
        for (name, body) in &idea.sections {
            lines.push(String::new());
            lines.push(format!("## {}", name));
            lines.extend(body.iter().cloned());
        }
        lines.join("\n")
    }
}

/// One idea by its `<category>/<slug>` id.
pub fn idea_show(storage: &Storage, id: &str) -> Result<IdeaShow> {
    storage.get_idea(id).map(IdeaShow)
}
