//! Typed request envelopes, one per tool.
//!
//! Requests are deserialized from JSON and validated once with
//! `validate()`; the engine only ever sees well-formed shapes. Path
//! preconditions are checked separately by [`crate::safety`].

use crate::encoding::Encoding;
use crate::ops::{AppendOperation, DeleteOperation, InsertOperation, PatchOperation};
use crate::range::LineRange;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Patch one or more files. Each file is committed on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchRequest {
    pub files: Vec<FilePatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilePatch {
    pub file_path: PathBuf,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub require_exact_match: Option<bool>,
    pub patches: Vec<PatchOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub require_exact_match: Option<bool>,
    pub deletions: Vec<DeleteOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub require_exact_match: Option<bool>,
    pub insertions: Vec<InsertOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub require_exact_match: Option<bool>,
    #[serde(flatten)]
    pub operation: AppendOperation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub file_path: PathBuf,
    pub contents: String,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

/// Whole-file read, optionally sliced by `start`/`end`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadRangesRequest {
    pub files: Vec<FileRanges>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRanges {
    pub file_path: PathBuf,
    pub ranges: Vec<LineRange>,
}

#[derive(Debug, Clone)]
pub struct RequestError {
    pub issues: Vec<RequestIssue>,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RequestError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestIssue {
    EmptyList {
        field: &'static str,
    },
    EmptyRanges {
        field: &'static str,
        index: usize,
    },
    InvalidLineNumber {
        index: usize,
    },
    InvalidSlice {
        start: usize,
        end: usize,
    },
}

impl fmt::Display for RequestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIssue::EmptyList { field } => write!(f, "{field} must be a non-empty list"),
            RequestIssue::EmptyRanges { field, index } => {
                write!(f, "{field}[{index}] must list at least one range")
            }
            RequestIssue::InvalidLineNumber { index } => {
                write!(f, "insertions[{index}].line_number must be a positive integer")
            }
            RequestIssue::InvalidSlice { start, end } => {
                write!(f, "end line {end} must be greater than or equal to start line {start}")
            }
        }
    }
}

fn finish(issues: Vec<RequestIssue>) -> Result<(), RequestError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RequestError { issues })
    }
}

fn check_ranges<'a>(
    field: &'static str,
    ranges: impl Iterator<Item = &'a [LineRange]>,
    issues: &mut Vec<RequestIssue>,
) {
    for (index, ranges) in ranges.enumerate() {
        if ranges.is_empty() {
            issues.push(RequestIssue::EmptyRanges { field, index });
        }
    }
}

impl PatchRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut issues = Vec::new();
        if self.files.is_empty() {
            issues.push(RequestIssue::EmptyList { field: "files" });
        }
        for file in &self.files {
            if let Err(e) = file.validate() {
                issues.extend(e.issues);
            }
        }
        finish(issues)
    }
}

impl FilePatch {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut issues = Vec::new();
        if self.patches.is_empty() {
            issues.push(RequestIssue::EmptyList { field: "patches" });
        }
        check_ranges(
            "patches",
            self.patches.iter().map(|p| p.ranges.as_slice()),
            &mut issues,
        );
        finish(issues)
    }
}

impl DeleteRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut issues = Vec::new();
        if self.deletions.is_empty() {
            issues.push(RequestIssue::EmptyList { field: "deletions" });
        }
        check_ranges(
            "deletions",
            self.deletions.iter().map(|d| d.ranges.as_slice()),
            &mut issues,
        );
        finish(issues)
    }
}

impl InsertRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut issues = Vec::new();
        if self.insertions.is_empty() {
            issues.push(RequestIssue::EmptyList { field: "insertions" });
        }
        for (index, insertion) in self.insertions.iter().enumerate() {
            if insertion.line_number < 1 {
                issues.push(RequestIssue::InvalidLineNumber { index });
            }
        }
        finish(issues)
    }
}

impl ReadRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        match (self.start, self.end) {
            (start, Some(end)) if end < start.unwrap_or(1) => {
                finish(vec![RequestIssue::InvalidSlice {
                    start: start.unwrap_or(1),
                    end,
                }])
            }
            _ => Ok(()),
        }
    }
}

impl ReadRangesRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut issues = Vec::new();
        if self.files.is_empty() {
            issues.push(RequestIssue::EmptyList { field: "files" });
        }
        check_ranges(
            "files",
            self.files.iter().map(|f| f.ranges.as_slice()),
            &mut issues,
        );
        finish(issues)
    }
}
