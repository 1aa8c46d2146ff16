//! Markdown documents organized into `## Section` blocks.
//!
//! Ideas, tasks and PRD documents are plain markdown files with a `# Title`
//! first line and `## Header` sections. [`Document`] splits such text into
//! sections; the per-kind modules pull typed fields out of them using the
//! prefix tables in [`rules`] and write records back in their canonical
//! templates.

pub mod idea;
pub mod prd;
pub mod rules;
pub mod task;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;

/// Section holding lines that appear before the first `## ` header.
pub const CONTENT_SECTION: &str = "content";

/// File identity and timestamps attached to a parsed record.
#[derive(Debug, Clone)]
pub struct SourceInfo<'a> {
    pub path: &'a Path,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl<'a> SourceInfo<'a> {
    /// File name without the `.md` extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A markdown text split into title and sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Remainder of a first line starting with `# `
    pub title: Option<String>,
    /// Body lines by lower-cased section name
    pub sections: BTreeMap<String, Vec<String>>,
    /// Section names in order of first appearance
    pub order: Vec<String>,
}

impl Document {
    /// Split `text` into title and sections.
    ///
    /// Lines before the first `## ` header land in [`CONTENT_SECTION`]. A
    /// header repeated later appends to the section it already started.
    pub fn parse(text: &str) -> Self {
        let mut doc = Document::default();
        let mut lines = text.lines().peekable();

        if let Some(first) = lines.peek() {
            if let Some(rest) = first.strip_prefix("# ") {
                doc.title = Some(rest.trim().to_string());
                lines.next();
            }
        }

        let mut current = CONTENT_SECTION.to_string();
        for line in lines {
            if let Some(header) = line.strip_prefix("## ") {
                current = header.trim().to_lowercase();
                doc.start_section(&current);
                continue;
            }
            if current == CONTENT_SECTION && !doc.sections.contains_key(CONTENT_SECTION) {
                doc.start_section(CONTENT_SECTION);
            }
            if let Some(body) = doc.sections.get_mut(&current) {
                body.push(line.to_string());
            }
        }

        doc
    }

    fn start_section(&mut self, name: &str) {
        if !self.sections.contains_key(name) {
            self.sections.insert(name.to_string(), Vec::new());
            self.order.push(name.to_string());
        }
    }

    /// Title from the first line, or one derived from `file_stem`.
    pub fn title_or_fallback(&self, file_stem: &str) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| fallback_title(file_stem))
    }

    /// Body lines of a section.
    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    /// Section body joined with newlines and trimmed; empty when absent.
    pub fn section_text(&self, name: &str) -> String {
        self.section(name)
            .map(|lines| lines.join("\n").trim().to_string())
            .unwrap_or_default()
    }

    /// Sections with their body lines, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .filter_map(|name| self.sections.get_key_value(name))
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }
}

/// Title derived from a file name: hyphens become spaces, words title-cased.
pub fn fallback_title(file_stem: &str) -> String {
    file_stem
        .split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Filesystem-safe file name fragment for a title.
///
/// Lower-cases, turns whitespace into hyphens and drops anything that is not
/// alphanumeric, `-` or `_`. Runs of hyphens collapse into one.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Render markdown to HTML for previews.
pub fn to_html(text: &str) -> String {
    use pulldown_cmark::{Options, Parser, html};

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(text, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Drop trailing blank lines from a section body.
pub(crate) fn trim_trailing_blank(lines: &[String]) -> Vec<String> {
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].to_vec()
}
