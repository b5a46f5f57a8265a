//! Operation variants consumed by the engine.

use crate::range::LineRange;
use serde::Deserialize;

/// Replace the content of each range with `new_string` once `old_string`
/// is confirmed to be there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchOperation {
    pub old_string: String,
    pub new_string: String,
    pub ranges: Vec<LineRange>,
}

/// Remove the lines of each range once `expected_content` is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteOperation {
    pub expected_content: String,
    pub ranges: Vec<LineRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

/// Insert content next to a single reference line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsertOperation {
    pub content_to_insert: String,
    pub position: Position,
    pub context_line: String,
    pub line_number: usize,
}

/// Append content after the last line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppendOperation {
    pub content_to_append: String,
    pub expected_file_ending: String,
}

impl PatchOperation {
    pub fn new(
        old_string: impl Into<String>,
        new_string: impl Into<String>,
        ranges: Vec<LineRange>,
    ) -> Self {
        Self {
            old_string: old_string.into(),
            new_string: new_string.into(),
            ranges,
        }
    }
}

impl DeleteOperation {
    pub fn new(expected_content: impl Into<String>, ranges: Vec<LineRange>) -> Self {
        Self {
            expected_content: expected_content.into(),
            ranges,
        }
    }
}

impl InsertOperation {
    pub fn new(
        content_to_insert: impl Into<String>,
        position: Position,
        context_line: impl Into<String>,
        line_number: usize,
    ) -> Self {
        Self {
            content_to_insert: content_to_insert.into(),
            position,
            context_line: context_line.into(),
            line_number,
        }
    }

    /// Zero-based index the new lines go in at, before any other insert
    /// in the batch has shifted the buffer.
    pub(crate) fn target_index(&self) -> usize {
        match self.position {
            Position::Before => self.line_number - 1,
            Position::After => self.line_number,
        }
    }
}

impl AppendOperation {
    pub fn new(content_to_append: impl Into<String>, expected_file_ending: impl Into<String>) -> Self {
        Self {
            content_to_append: content_to_append.into(),
            expected_file_ending: expected_file_ending.into(),
        }
    }
}
