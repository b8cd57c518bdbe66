//! Note and search result records handed out by the repository.
use std::fmt;

use serde::Serialize;

use crate::Timestamp;

/// Represents a single note in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Identifier of the note
    pub timestamp: Timestamp,
    /// Text of the note, one entry per line
    pub lines: Vec<String>,
}

impl Note {
    pub fn new(timestamp: Timestamp, lines: Vec<String>) -> Self {
        Note { timestamp, lines }
    }

    /// First line of the note without Markdown heading markers.
    pub fn subject(&self) -> &str {
        self.lines
            .first()
            .map(|line| remove_heading_markup(line))
            .unwrap_or("")
    }
}

/// One matching line found by a text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub timestamp: Timestamp,
    /// 1-based line number within the note
    pub line_number: usize,
    /// The whole matching line
    pub text: String,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.timestamp, self.line_number, self.text)
    }
}

/// Strips leading whitespace and a `#`-style heading prefix from a line.
pub fn remove_heading_markup(line: &str) -> &str {
    let line = line.trim_start();
    let rest = line.trim_start_matches('#');
    if rest.len() == line.len() {
        line
    } else {
        rest.trim_start_matches([' ', '\t'])
    }
}

/// A text counts as empty when it has no non-blank line.
pub fn is_blank(lines: &[String]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
}
