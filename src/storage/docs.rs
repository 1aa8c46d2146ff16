//! Markdown-backed records: ideas, tasks and PRD documents.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{Storage, file_times, path_to_slash};
use crate::markdown::{self, SourceInfo};
use crate::models::{Idea, IdeaCategory, IdeaDraft, PrdDoc, Task, TaskDraft, TaskStatus};
use crate::{Error, Result};

/// Outcome of a status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMove {
    pub task: Task,
    /// False when the task already had the requested status
    pub moved: bool,
}

/// Markdown files directly inside `dir`, sorted by name. A missing directory is empty.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one file for a batch scan, logging and skipping it on failure.
fn read_for_scan(path: &Path) -> Option<(String, SourceTimes)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
            return None;
        }
    };
    match file_times(path) {
        Ok(times) => Some((text, times)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping file without metadata");
            None
        }
    }
}

type SourceTimes = (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>);

fn source(path: &Path, times: SourceTimes) -> SourceInfo<'_> {
    SourceInfo {
        path,
        created: times.0,
        modified: times.1,
    }
}

/// Reject ids that would leave their folder.
fn safe_component(value: &str) -> bool {
    !value.is_empty() && value != "." && value != ".." && !value.contains(['/', '\\'])
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Storage {
    // ==================== Ideas ====================

    fn parse_idea_file(path: &Path, category: IdeaCategory) -> Result<Idea> {
        let text = fs::read_to_string(path)?;
        let times = file_times(path)?;
        Ok(markdown::idea::parse(&text, category, &source(path, times)))
    }

    /// All ideas, highest total score first.
    pub fn list_ideas(&self) -> Result<Vec<Idea>> {
        let mut ideas = Vec::new();
        for category in IdeaCategory::ALL {
            for path in markdown_files(&self.layout.category_dir(category))? {
                if let Some((text, times)) = read_for_scan(&path) {
                    ideas.push(markdown::idea::parse(&text, category, &source(&path, times)));
                }
            }
        }
        ideas.sort_by(|a, b| b.score.total.cmp(&a.score.total).then_with(|| a.title.cmp(&b.title)));
        Ok(ideas)
    }

    /// One idea by `<category>/<stem>` id.
    pub fn get_idea(&self, id: &str) -> Result<Idea> {
        let not_found = || Error::NotFound(format!("Idea not found: {}", id));
        let (category, stem) = id.split_once('/').ok_or_else(not_found)?;
        let category: IdeaCategory = category.parse().map_err(|_| not_found())?;
        if !safe_component(stem) {
            return Err(not_found());
        }
        let path = self.layout.category_dir(category).join(format!("{}.md", stem));
        if !path.is_file() {
            return Err(not_found());
        }
        Self::parse_idea_file(&path, category)
    }

    /// Write an idea into its category folder under the slug of its title.
    ///
    /// Saving over an existing file keeps that file's `## Created:` date.
    pub fn save_idea(&self, draft: &IdeaDraft) -> Result<Idea> {
        let category = draft.category();
        let title = markdown::idea::draft_title(draft);
        let dir = self.layout.category_dir(category);
        fs::create_dir_all(&dir)?;
        let path = dir.join(markdown::idea::file_name(&title));

        let created_on = if path.is_file() {
            Self::parse_idea_file(&path, category)?.created_on
        } else {
            None
        };

        fs::write(&path, markdown::idea::render(draft, today(), created_on))?;
        tracing::debug!(path = %path.display(), "Saved idea");
        Self::parse_idea_file(&path, category)
    }

    // ==================== Tasks ====================

    fn parse_task_file(path: &Path, status: TaskStatus) -> Result<Task> {
        let text = fs::read_to_string(path)?;
        let times = file_times(path)?;
        Ok(markdown::task::parse(&text, status, &source(path, times)))
    }

    fn scan_status(&self, status: &TaskStatus) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for path in markdown_files(&self.layout.status_dir(status))? {
            if let Some((text, times)) = read_for_scan(&path) {
                tasks.push(markdown::task::parse(&text, status.clone(), &source(&path, times)));
            }
        }
        Ok(tasks)
    }

    /// Tasks, most recently modified first.
    ///
    /// Without a filter the five standard status folders are scanned; a filter
    /// scans just that folder, custom statuses included.
    pub fn list_tasks(&self, status: Option<&TaskStatus>) -> Result<Vec<Task>> {
        let mut tasks = match status {
            Some(status) => self.scan_status(status)?,
            None => {
                let mut all = Vec::new();
                for status in &TaskStatus::STANDARD {
                    all.extend(self.scan_status(status)?);
                }
                all
            }
        };
        tasks.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(tasks)
    }

    /// First task file, in standard status order, whose name contains `id`.
    ///
    /// The match is on the file name only; the `**ID**` line inside the file
    /// does not take part.
    fn find_task(&self, id: &str) -> Result<Option<Task>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        for status in &TaskStatus::STANDARD {
            for path in markdown_files(&self.layout.status_dir(status))? {
                let named = path
                    .file_stem()
                    .is_some_and(|stem| stem.to_string_lossy().contains(id));
                if named {
                    return Self::parse_task_file(&path, status.clone()).map(Some);
                }
            }
        }
        Ok(None)
    }

    /// One task by id, searching the standard status folders.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.find_task(id)?
            .ok_or_else(|| Error::NotFound(format!("Task with ID {} not found", id)))
    }

    /// Write a task.
    ///
    /// A draft whose `id` names an existing task rewrites that task's file,
    /// relocating it when the status changed. Anything else is a new task with
    /// the next free id for today.
    pub fn save_task(&self, draft: &TaskDraft) -> Result<Task> {
        let status = draft.status();
        let existing = match draft.id.as_deref() {
            Some(id) => self.find_task(id)?,
            None => None,
        };

        let (id, file_name, previous) = match existing {
            Some(task) => {
                let file_name = task
                    .file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| Error::Other(format!("Task file has no name: {}", task.file_path.display())))?;
                let id = draft.id.clone().unwrap_or(task.id);
                (id, file_name, Some(task.file_path))
            }
            None => {
                if let Some(ref id) = draft.id {
                    tracing::debug!(id = %id, "Unknown task id, creating a new task");
                }
                let id = self.next_task_id(&status)?;
                let file_name = markdown::task::task_file_name(&id, &markdown::task::draft_title(draft));
                (id, file_name, None)
            }
        };

        let dir = self.layout.status_dir(&status);
        fs::create_dir_all(&dir)?;
        let path = dir.join(&file_name);
        fs::write(&path, markdown::task::render(&id, draft))?;
        if let Some(previous) = previous.filter(|p| *p != path) {
            fs::remove_file(&previous)?;
            tracing::debug!(from = %previous.display(), to = %path.display(), "Relocated task");
        }
        tracing::debug!(path = %path.display(), "Saved task");
        Self::parse_task_file(&path, status)
    }

    fn next_task_id(&self, status: &TaskStatus) -> Result<String> {
        let mut statuses: Vec<TaskStatus> = TaskStatus::STANDARD.to_vec();
        if !status.is_standard() {
            statuses.push(status.clone());
        }
        let mut existing = Vec::new();
        for s in statuses {
            for task in self.scan_status(&s)? {
                existing.push((s.clone(), task.id));
            }
        }
        let date = today();
        let sequence = markdown::task::next_sequence(date, status, &existing);
        Ok(markdown::task::format_task_id(date, sequence))
    }

    /// Move a task into another status folder, keeping its file name.
    pub fn move_task(&self, id: &str, status: &TaskStatus) -> Result<TaskMove> {
        let task = self.get_task(id)?;
        if task.status == *status {
            return Ok(TaskMove { task, moved: false });
        }

        let file_name = task
            .file_path
            .file_name()
            .ok_or_else(|| Error::Other(format!("Task file has no name: {}", task.file_path.display())))?;
        let dir = self.layout.status_dir(status);
        fs::create_dir_all(&dir)?;
        let target = dir.join(file_name);
        if target.exists() {
            return Err(Error::InvalidInput(format!(
                "A file named {} already exists in {}",
                file_name.to_string_lossy(),
                status
            )));
        }
        fs::rename(&task.file_path, &target)?;
        tracing::debug!(id, from = %task.status, to = %status, "Moved task");

        Ok(TaskMove {
            task: Self::parse_task_file(&target, status.clone())?,
            moved: true,
        })
    }

    // ==================== PRD ====================

    /// PRD documents anywhere under the PRD folder, most recently modified first.
    /// Hidden folders are skipped.
    pub fn list_prd_docs(&self) -> Result<Vec<PrdDoc>> {
        let prd_dir = self.layout.prd_dir();
        if !prd_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        let walker = WalkDir::new(&prd_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable PRD entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&prd_dir) else {
                continue;
            };
            let Some((text, times)) = read_for_scan(path) else {
                continue;
            };
            let id = path_to_slash(relative);
            let docs_relative = format!("{}/{}", super::PRD_DIR, id);
            docs.push(markdown::prd::parse(&text, &source(path, times), &id, &docs_relative));
        }

        docs.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(docs)
    }
}
