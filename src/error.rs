use crate::encoding::{Encoding, EncodingError};
use crate::matcher::MatchMode;
use crate::range::LineRange;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single file's edit. Every variant leaves the file on disk
/// exactly as it was before the call.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf, suggest_create: bool },

    #[error("File already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Line range {range} is out of bounds (file has {total_lines} lines)")]
    RangeOutOfBounds { range: LineRange, total_lines: usize },

    #[error("Overlapping ranges {scope}: lines {first} and {second}")]
    OverlappingRanges {
        scope: OverlapScope,
        first: LineRange,
        second: LineRange,
    },

    #[error("Content mismatch at {site}: expected content does not match the file")]
    ContentMismatch { site: MismatchSite, mode: MatchMode },

    #[error("Encoding failure on {} ({encoding}): {source}", .path.display())]
    Encoding {
        path: PathBuf,
        encoding: Encoding,
        #[source]
        source: EncodingError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Whether two overlapping ranges came from one operation or two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapScope {
    WithinOperation { operation: usize },
    AcrossOperations { first: usize, second: usize },
}

impl fmt::Display for OverlapScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapScope::WithinOperation { operation } => {
                write!(f, "within operation {}", operation + 1)
            }
            OverlapScope::AcrossOperations { first, second } => {
                write!(f, "across operations {} and {}", first + 1, second + 1)
            }
        }
    }
}

/// Where a content check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchSite {
    Lines(LineRange),
    Line(usize),
    FileEnding,
}

impl fmt::Display for MismatchSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchSite::Lines(range) => write!(f, "lines {range}"),
            MismatchSite::Line(line) => write!(f, "line {line}"),
            MismatchSite::FileEnding => write!(f, "final line"),
        }
    }
}

impl EditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return EditError::NotFound {
                path: path.into(),
                suggest_create: false,
            };
        }
        EditError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short guidance on how to build a request that will succeed.
    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            EditError::NotFound { .. } => "File must exist before it can be edited".to_string(),
            EditError::AlreadyExists { .. } => {
                "Use the patch, insert or append tools to modify an existing file".to_string()
            }
            EditError::RangeOutOfBounds { .. } => {
                "Line numbers must be within file bounds and end must be >= start".to_string()
            }
            EditError::OverlappingRanges {
                scope: OverlapScope::WithinOperation { .. },
                ..
            } => "Ranges within a single operation cannot overlap".to_string(),
            EditError::OverlappingRanges {
                scope: OverlapScope::AcrossOperations { .. },
                ..
            } => "Ranges across different operations cannot overlap".to_string(),
            EditError::ContentMismatch { mode, .. } => format!(
                "Re-read the file and make the expected content match the current lines ({})",
                mode.describe()
            ),
            EditError::Encoding { .. } => {
                "Check that the file is stored in the requested encoding".to_string()
            }
            EditError::Io { .. } => "Please check file permissions and try again".to_string(),
            EditError::Unexpected(_) => {
                "Please try again or report the issue if it persists".to_string()
            }
        };
        Some(hint)
    }

    /// Corrective action to steer the caller towards, when one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            EditError::NotFound {
                suggest_create: true,
                ..
            } => Some("create_text_file"),
            _ => None,
        }
    }
}
