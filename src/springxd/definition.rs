//! `name = definition` lines of a stream/job paragraph.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::completion::LINE_SEPARATOR;

static NAMED_DEFINITION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9_]*)\s*=\s*(.*)$").expect("valid named definition pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDefinition {
    pub name: String,
    pub definition: String,
}

impl NamedDefinition {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self { name: name.into(), definition: definition.into() }
    }
}

/// `None` when the line does not match or either side is blank.
pub fn parse_line(line: &str) -> Option<NamedDefinition> {
    let caps = NAMED_DEFINITION_PATTERN.captures(line)?;
    let name = caps.get(1)?.as_str().trim();
    let definition = caps.get(2)?.as_str().trim();
    if name.is_empty() || definition.is_empty() {
        return None;
    }
    Some(NamedDefinition::new(name, definition))
}

/// Named definitions of a paragraph, in line order. Other lines are skipped.
pub fn parse_block(text: &str) -> Vec<NamedDefinition> {
    text.split(LINE_SEPARATOR)
        .filter_map(|line| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                tracing::info!(line = %line, "skipped line");
            }
            parsed
        })
        .collect()
}
