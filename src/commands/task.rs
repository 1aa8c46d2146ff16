//! Task commands.

use serde::Serialize;
use std::path::PathBuf;

use super::{Output, counted};
use crate::Result;
use crate::models::{Task, TaskDraft, TaskStatus};
use crate::storage::Storage;

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub count: usize,
    pub tasks: Vec<Task>,
}

impl Output for TaskList {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found.".to_string();
        }
        let mut lines = vec![format!("{}:", counted(self.count, "task"))];
        for task in &self.tasks {
            let mut line = format!("  {} [{}] {}", task.id, task.status, task.title);
            if !task.priority.is_empty() {
                line.push_str(&format!(" (priority: {})", task.priority));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Tasks, most recently modified first, optionally limited to one status.
pub fn task_list(storage: &Storage, status: Option<&str>) -> Result<TaskList> {
    let status = status.map(str::parse::<TaskStatus>).transpose()?;
    let tasks = storage.list_tasks(status.as_ref())?;
    Ok(TaskList {
        count: tasks.len(),
        tasks,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskSaved {
    pub success: bool,
    pub id: String,
    pub file_path: PathBuf,
    pub task: Task,
}

impl Output for TaskSaved {
    fn to_human(&self) -> String {
        format!(
            "Saved task {} \"{}\" [{}]\n  {}",
            self.id,
            self.task.title,
            self.task.status,
            self.file_path.display()
        )
    }
}

/// Create a task, or rewrite the task named by `draft.id`.
pub fn task_add(storage: &Storage, draft: &TaskDraft) -> Result<TaskSaved> {
    let task = storage.save_task(draft)?;
    Ok(TaskSaved {
        success: true,
        id: task.id.clone(),
        file_path: task.file_path.clone(),
        task,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskMoved {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip)]
    pub task: Task,
}

impl Output for TaskMoved {
    fn to_human(&self) -> String {
        match (&self.message, &self.file_path) {
            (Some(message), _) => format!("{}: {} [{}]", message, self.task.id, self.task.status),
            (None, Some(path)) => format!(
                "Moved task {} to {}\n  {}",
                self.task.id,
                self.task.status,
                path.display()
            ),
            (None, None) => format!("Moved task {} to {}", self.task.id, self.task.status),
        }
    }
}

/// Move a task into another status folder.
pub fn task_move(storage: &Storage, id: &str, status: &str) -> Result<TaskMoved> {
    let status: TaskStatus = status.parse()?;
    let moved = storage.move_task(id, &status)?;
    if moved.moved {
        Ok(TaskMoved {
            success: true,
            message: None,
            file_path: Some(moved.task.file_path.clone()),
            task: moved.task,
        })
    } else {
        Ok(TaskMoved {
            success: true,
            message: Some("Task already in this status".to_string()),
            file_path: None,
            task: moved.task,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TaskShow(pub Task);

impl Output for TaskShow {
    fn to_human(&self) -> String {
        let task = &self.0;
        let mut lines = vec![
            format!("{} {}", task.id, task.title),
            format!("  Status:         {}", task.status),
        ];
        let fields = [
            ("Type", &task.task_type),
            ("Estimated Time", &task.estimated_time),
            ("Milestone", &task.milestone),
            ("Priority", &task.priority),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                lines.push(format!("  {:<15} {}", format!("{}:", label), value));
            }
        }
        let sections = [
            ("Description", &task.description),
            ("Objective", &task.objective),
            ("Acceptance Criteria", &task.acceptance_criteria),
            ("Implementation Notes", &task.implementation_notes),
            ("Dependencies", &task.dependencies),
            ("Testing Plan", &task.testing_plan),
            ("Next Steps", &task.next_steps),
        ];
        for (name, body) in sections {
            if !body.trim().is_empty() {
                lines.push(String::new());
                lines.push(format!("## {}", name));
                lines.push(body.to_string());
            }
        }
        lines.join("\n")
    }
}

pub fn task_show(storage: &Storage, id: &str) -> Result<TaskShow> {
    storage.get_task(id).map(TaskShow)
}
