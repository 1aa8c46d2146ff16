//! Idea files: `Ideas/<category>/<slug>.md`.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::rules::{self, LineRule};
use super::{CONTENT_SECTION, Document, SourceInfo, slugify, trim_trailing_blank};
use crate::models::{DEFAULT_IDEA_STATUS, Idea, IdeaCategory, IdeaDraft, IdeaScore};

const DEFAULT_TITLE: &str = "New Idea";
const DEFAULT_SUMMARY: &str = "Brief one-sentence description of the idea.";
const DEFAULT_DESCRIPTION: &str =
    "Detailed description of the idea, including how it would work in the game.";
const DEFAULT_NOTES: &str =
    "- Add any additional notes or considerations here\n- Links to related ideas or research";

const CREATED_HEADER: &str = "created:";
const UPDATED_HEADER: &str = "last updated:";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sections folded into typed fields rather than kept as raw content.
const TYPED_SECTIONS: &[&str] = &["status", "summary", "tags", "score", "category"];

/// Score line fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Impact,
    Feasibility,
    Originality,
    PlayerValue,
    Alignment,
    Total,
}

/// Score lines, in template order.
pub const SCORE_RULES: &[LineRule<ScoreField>] = &[
    LineRule { prefix: "- Impact:", field: ScoreField::Impact },
    LineRule { prefix: "- Feasibility:", field: ScoreField::Feasibility },
    LineRule { prefix: "- Originality:", field: ScoreField::Originality },
    LineRule { prefix: "- Player Value:", field: ScoreField::PlayerValue },
    LineRule { prefix: "- Alignment with Game Vision:", field: ScoreField::Alignment },
    LineRule { prefix: "- **Total Score**:", field: ScoreField::Total },
];

impl ScoreField {
    fn slot(self, score: &mut IdeaScore) -> (&'static str, &mut i64) {
        match self {
            ScoreField::Impact => ("impact", &mut score.impact),
            ScoreField::Feasibility => ("feasibility", &mut score.feasibility),
            ScoreField::Originality => ("originality", &mut score.originality),
            ScoreField::PlayerValue => ("player_value", &mut score.player_value),
            ScoreField::Alignment => ("alignment", &mut score.alignment),
            ScoreField::Total => ("total", &mut score.total),
        }
    }

    fn get(self, score: &IdeaScore) -> i64 {
        match self {
            ScoreField::Impact => score.impact,
            ScoreField::Feasibility => score.feasibility,
            ScoreField::Originality => score.originality,
            ScoreField::PlayerValue => score.player_value,
            ScoreField::Alignment => score.alignment,
            ScoreField::Total => score.total,
        }
    }
}

/// Parse an idea file's text. The category comes from the containing folder.
pub fn parse(text: &str, category: IdeaCategory, source: &SourceInfo<'_>) -> Idea {
    let doc = Document::parse(text);
    let stem = source.stem();

    let mut score = IdeaScore::default();
    let mut status: Option<String> = None;
    let mut summary: Vec<&str> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut created_on = None;
    let mut updated_on = None;
    let mut sections = BTreeMap::new();

    for (name, lines) in doc.iter() {
        if let Some(date) = name.strip_prefix(CREATED_HEADER) {
            created_on = parse_date(date);
            continue;
        }
        if let Some(date) = name.strip_prefix(UPDATED_HEADER) {
            updated_on = parse_date(date);
            continue;
        }

        let mut kept = Vec::new();
        for line in lines {
            if let Some((field, value)) = rules::match_line(SCORE_RULES, line) {
                let (label, slot) = field.slot(&mut score);
                rules::set_int(slot, label, value);
                continue;
            }
            let trimmed = line.trim();
            match name {
                "status" if !trimmed.is_empty() => status = Some(trimmed.to_string()),
                "summary" if !trimmed.is_empty() => summary.push(trimmed),
                "tags" => {
                    for tag in rules::parse_tags(trimmed) {
                        if !tags.contains(&tag) {
                            tags.push(tag);
                        }
                    }
                }
                _ if TYPED_SECTIONS.contains(&name) => {}
                _ => kept.push(line.clone()),
            }
        }

        let kept = trim_trailing_blank(&kept);
        let blank_content = name == CONTENT_SECTION && kept.iter().all(|l| l.trim().is_empty());
        if !TYPED_SECTIONS.contains(&name) && !blank_content {
            sections.insert(name.to_string(), kept);
        }
    }

    Idea {
        id: format!("{}/{}", category, stem),
        title: doc.title_or_fallback(&stem),
        category,
        status: status.unwrap_or_else(|| DEFAULT_IDEA_STATUS.to_string()),
        summary: summary.join(" "),
        score,
        tags,
        sections,
        created_on,
        updated_on,
        file_path: source.path.to_path_buf(),
        created: source.created,
        modified: source.modified,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!(value, "Unparseable idea date header, ignoring");
            None
        }
    }
}

/// Title an idea draft will be written under.
pub fn draft_title(draft: &IdeaDraft) -> String {
    draft
        .title
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

/// File name for an idea: slugged title plus `.md`.
pub fn file_name(title: &str) -> String {
    format!("{}.md", slugify(title))
}

/// Render an idea into the canonical template.
///
/// The total score is always the sum of the five sub-scores. `created_on` keeps
/// an existing file's creation date; `today` fills in anything missing.
pub fn render(draft: &IdeaDraft, today: NaiveDate, created_on: Option<NaiveDate>) -> String {
    let title = draft_title(draft);
    let score = draft.score.resolve();
    let tags = draft.tags.as_ref().map(|t| t.to_tags()).unwrap_or_default();
    let created_on = created_on.unwrap_or(today);

    let score_lines = SCORE_RULES
        .iter()
        .map(|rule| rule.render(rule.field.get(&score)))
        .collect::<Vec<_>>()
        .join("\n");

    let notes = draft
        .notes
        .as_ref()
        .map(|n| n.render())
        .unwrap_or_else(|| DEFAULT_NOTES.to_string());

    format!(
        "# {title}\n\n\
         ## Summary\n{summary}\n\n\
         ## Description\n{description}\n\n\
         ## Category\n{category}\n\n\
         ## Tags\n{tags}\n\n\
         ## Status\n{status}\n\n\
         ## Score\n{score_lines}\n\n\
         ## Notes\n{notes}\n\n\
         ## Created: {created}\n\
         ## Last Updated: {updated}\n",
        title = title,
        summary = draft.summary.as_deref().unwrap_or(DEFAULT_SUMMARY),
        description = draft.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION),
        category = draft.category(),
        tags = rules::render_tags(&tags),
        status = draft.status.as_deref().unwrap_or(DEFAULT_IDEA_STATUS),
        score_lines = score_lines,
        notes = notes,
        created = created_on.format(DATE_FORMAT),
        updated = today.format(DATE_FORMAT),
    )
}
