//! PRD documents, listed read-only.

use super::{SourceInfo, fallback_title};
use crate::models::PrdDoc;

/// Parse a PRD document.
///
/// `id` is the path relative to the PRD folder and `path` the one relative to
/// the docs folder, both with `/` separators.
pub fn parse(text: &str, source: &SourceInfo<'_>, id: &str, path: &str) -> PrdDoc {
    let mut lines = text.lines().peekable();
    // Only the very first line can carry the title
    let title = lines
        .next_if(|line| line.starts_with("# "))
        .map(|line| line[2..].trim().to_string());

    PrdDoc {
        id: id.to_string(),
        title: title.unwrap_or_else(|| fallback_title(&source.stem())),
        summary: first_paragraph(lines),
        path: path.to_string(),
        file_path: source.path.to_path_buf(),
        created: source.created,
        modified: source.modified,
    }
}

/// First run of non-blank, non-heading lines, joined with spaces.
fn first_paragraph<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut paragraph: Vec<&str> = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        paragraph.push(line);
    }
    paragraph.join(" ")
}
