//! Task files: `Tasks/<status>/<YYYY-MM-DD-NN>-<slug>.md`.

use chrono::NaiveDate;

use super::rules::{self, LineRule};
use super::{Document, SourceInfo, slugify};
use crate::models::{ListField, Task, TaskDraft, TaskStatus};

const DEFAULT_TITLE: &str = "New Task";
const DEFAULT_TYPE: &str = "Feature";
const DEFAULT_ESTIMATE: &str = "30 minutes";
const DEFAULT_MILESTONE: &str = "Phase 1";
const DEFAULT_PRIORITY: &str = "Medium";

const TITLE_MARKER: &str = "Task:";
const INFO_SECTION: &str = "basic information";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Type,
    EstimatedTime,
    Milestone,
    Priority,
}

/// Lines of the basic information block, in template order.
pub const TASK_RULES: &[LineRule<TaskField>] = &[
    LineRule { prefix: "- **ID**:", field: TaskField::Id },
    LineRule { prefix: "- **Type**:", field: TaskField::Type },
    LineRule { prefix: "- **Estimated Time**:", field: TaskField::EstimatedTime },
    LineRule { prefix: "- **Milestone**:", field: TaskField::Milestone },
    LineRule { prefix: "- **Priority**:", field: TaskField::Priority },
];

/// Free-text sections after the basic information block, in template order.
const BODY_SECTIONS: [&str; 7] = [
    "Description",
    "Objective",
    "Acceptance Criteria",
    "Implementation Notes",
    "Dependencies",
    "Testing Plan",
    "Next Steps",
];

/// Parse a task file's text. The status comes from the containing folder.
pub fn parse(text: &str, status: TaskStatus, source: &SourceInfo<'_>) -> Task {
    let doc = Document::parse(text);
    let stem = source.stem();

    let title = match &doc.title {
        Some(title) => strip_title_marker(title).to_string(),
        None => super::fallback_title(strip_id_prefix(&stem)),
    };

    let mut id = None;
    let mut task_type = String::new();
    let mut estimated_time = String::new();
    let mut milestone = String::new();
    let mut priority = String::new();

    for line in doc.section(INFO_SECTION).unwrap_or_default() {
        let Some((field, value)) = rules::match_line(TASK_RULES, line) else {
            continue;
        };
        let value = value.to_string();
        match field {
            TaskField::Id => id = Some(value).filter(|v| !v.is_empty()),
            TaskField::Type => task_type = value,
            TaskField::EstimatedTime => estimated_time = value,
            TaskField::Milestone => milestone = value,
            TaskField::Priority => priority = value,
        }
    }

    let id = id
        .or_else(|| id_from_file_name(&stem).map(str::to_string))
        .unwrap_or_else(|| stem.clone());
    let body = |name: &str| doc.section_text(&name.to_lowercase());

    Task {
        id,
        title,
        task_type,
        status,
        estimated_time,
        milestone,
        priority,
        description: body("Description"),
        objective: body("Objective"),
        acceptance_criteria: body("Acceptance Criteria"),
        implementation_notes: body("Implementation Notes"),
        dependencies: body("Dependencies"),
        testing_plan: body("Testing Plan"),
        next_steps: body("Next Steps"),
        file_path: source.path.to_path_buf(),
        created: source.created,
        modified: source.modified,
    }
}

fn strip_title_marker(title: &str) -> &str {
    title
        .strip_prefix(TITLE_MARKER)
        .map(str::trim)
        .unwrap_or(title)
}

/// Title a task draft will be written under.
pub fn draft_title(draft: &TaskDraft) -> String {
    let title = draft.title.as_deref().map(str::trim).unwrap_or(DEFAULT_TITLE);
    strip_title_marker(title).to_string()
}

/// Render a task into the canonical template.
pub fn render(id: &str, draft: &TaskDraft) -> String {
    let info = TASK_RULES
        .iter()
        .map(|rule| {
            let value = match rule.field {
                TaskField::Id => id,
                TaskField::Type => draft.task_type.as_deref().unwrap_or(DEFAULT_TYPE),
                TaskField::EstimatedTime => {
                    draft.estimated_time.as_deref().unwrap_or(DEFAULT_ESTIMATE)
                }
                TaskField::Milestone => draft.milestone.as_deref().unwrap_or(DEFAULT_MILESTONE),
                TaskField::Priority => draft.priority.as_deref().unwrap_or(DEFAULT_PRIORITY),
            };
            rule.render(value)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let list = |field: &Option<ListField>| field.as_ref().map(ListField::render).unwrap_or_default();
    let bodies = [
        draft.description.clone().unwrap_or_default(),
        draft.objective.clone().unwrap_or_default(),
        list(&draft.acceptance_criteria),
        list(&draft.implementation_notes),
        list(&draft.dependencies),
        list(&draft.testing_plan),
        list(&draft.next_steps),
    ];

    let mut out = format!(
        "# {} {}\n\n## Basic Information\n{}\n",
        TITLE_MARKER,
        draft_title(draft),
        info
    );
    for (header, body) in BODY_SECTIONS.iter().zip(bodies) {
        out.push_str(&format!("\n## {}\n{}\n", header, body.trim_end()));
    }
    out
}

/// Task id for a date and 1-based sequence number.
pub fn format_task_id(date: NaiveDate, sequence: u32) -> String {
    format!("{}-{:02}", date.format("%Y-%m-%d"), sequence)
}

/// File name for a task: `<id>-<slug>.md`.
pub fn task_file_name(id: &str, title: &str) -> String {
    format!("{}-{}.md", id, slugify(title))
}

/// Next sequence number for a task created on `date` in `status`.
///
/// Counts the tasks from that day already filed under `status`, then skips
/// ahead past any id taken by a task in another folder. Whenever that skip
/// happens the result is larger than the plain per-folder count plus one:
/// with `-01` and `-02` in Backlog and nothing in Review, a Review task gets
/// `3`, not `1`.
pub fn next_sequence(date: NaiveDate, status: &TaskStatus, existing: &[(TaskStatus, String)]) -> u32 {
    let prefix = format!("{}-", date.format("%Y-%m-%d"));
    let same_day = existing.iter().filter(|(_, id)| id.starts_with(&prefix));

    let in_status = same_day.clone().filter(|(s, _)| s == status).count() as u32;
    let mut sequence = in_status + 1;
    while same_day.clone().any(|(_, id)| *id == format_task_id(date, sequence)) {
        sequence += 1;
    }
    sequence
}

/// The `YYYY-MM-DD-NN` prefix of a task file stem, if it has one.
pub fn id_from_file_name(stem: &str) -> Option<&str> {
    let candidate = stem.get(..13)?;
    let bytes = candidate.as_bytes();
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 | 10 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    let date_ok = shape_ok && NaiveDate::parse_from_str(&candidate[..10], "%Y-%m-%d").is_ok();
    let boundary_ok = matches!(stem.as_bytes().get(13), None | Some(b'-'));
    (date_ok && boundary_ok).then_some(candidate)
}

fn strip_id_prefix(stem: &str) -> &str {
    match id_from_file_name(stem) {
        Some(id) => stem[id.len()..].trim_start_matches('-'),
        None => stem,
    }
}
