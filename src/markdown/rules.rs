//! Prefix rules mapping markdown lines to record fields.
//!
//! Each record kind declares a table of [`LineRule`]s. A line matches a rule
//! when, after leading whitespace, it starts with the rule's prefix; the value
//! is whatever follows the first `:` on the line, trimmed. The same tables
//! drive rendering, so a field is always written with the prefix it is read by.

/// One prefix → field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRule<F> {
    pub prefix: &'static str,
    pub field: F,
}

impl<F: Copy> LineRule<F> {
    /// The value carried by `line` if it matches this rule.
    pub fn value<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim_start();
        if line.starts_with(self.prefix) {
            Some(field_value(line))
        } else {
            None
        }
    }

    /// Render `value` as a line this rule reads back.
    pub fn render(&self, value: impl std::fmt::Display) -> String {
        format!("{} {}", self.prefix, value)
    }
}

/// Find the first rule matching `line`, returning its field and value.
pub fn match_line<'a, F: Copy>(rules: &[LineRule<F>], line: &'a str) -> Option<(F, &'a str)> {
    rules
        .iter()
        .find_map(|rule| rule.value(line).map(|value| (rule.field, value)))
}

/// Text after the first `:`, trimmed; empty when there is no colon.
pub fn field_value(line: &str) -> &str {
    line.split_once(':').map(|(_, rest)| rest.trim()).unwrap_or("")
}

/// Parse an integer field, keeping `slot` unchanged when `value` is not a number.
pub fn set_int(slot: &mut i64, field: &str, value: &str) {
    match value.parse::<i64>() {
        Ok(n) => *slot = n,
        Err(_) => {
            tracing::warn!(field, value, "Unparseable number, keeping previous value");
        }
    }
}

/// Split a `#tag1 #tag2` line into trimmed tag names.
pub fn parse_tags(line: &str) -> Vec<String> {
    line.split('#')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render tags as a `#tag1 #tag2` line.
pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}
