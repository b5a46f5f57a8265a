//! Read-only companions of the engine, plus file creation.
//!
//! Reads never check content and never fail on an out-of-range start: they
//! let callers discover current lines before building an edit request.

use crate::document::{create_new_file, Document, FlushOptions};
use crate::encoding::Encoding;
use crate::engine::{Change, EditOutcome, Engine};
use crate::error::EditError;
use crate::range::LineRange;
use crate::request::{CreateRequest, ReadRangesRequest, ReadRequest};
use crate::safety::SafetyError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A slice of a file with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeContent {
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub total_lines: usize,
    /// Size of `content` in bytes, in the file's encoding
    pub content_size: usize,
}

/// Slices read from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContents {
    pub file_path: PathBuf,
    pub ranges: Vec<RangeContent>,
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Slice `range` out of `doc`, clamping instead of failing.
///
/// A start below 1 is treated as 1 and an end past the last line as the last
/// line. A start past the last line gives an empty slice positioned at that
/// start.
pub fn slice_range(doc: &Document, range: &LineRange) -> RangeContent {
    let total_lines = doc.line_count();
    let start = range.start.max(1);
    let end = range.end.map_or(total_lines, |end| end.min(total_lines));

    let content = if start > total_lines || end < start {
        String::new()
    } else {
        doc.slice(start - 1..end)
    };
    let end = if start > total_lines { start } else { end };

    let content_size = doc
        .encoding()
        .encode(&content)
        .map_or(content.len(), |bytes| bytes.len());

    RangeContent {
        content,
        start,
        end,
        total_lines,
        content_size,
    }
}

pub fn read_ranges(
    path: &Path,
    ranges: &[LineRange],
    encoding: Encoding,
) -> Result<Vec<RangeContent>, EditError> {
    let doc = Document::load(path, encoding)?;
    Ok(ranges.iter().map(|range| slice_range(&doc, range)).collect())
}

/// Read `path`, sliced by `start`/`end` when given.
pub fn read_file(
    path: &Path,
    start: Option<usize>,
    end: Option<usize>,
    encoding: Encoding,
) -> Result<RangeContent, EditError> {
    let doc = Document::load(path, encoding)?;
    Ok(slice_range(&doc, &LineRange::new(start.unwrap_or(1), end)))
}

/// Create `path` with `contents`, creating parent directories as needed.
/// Fails if the file already exists.
pub fn create_file(
    path: &Path,
    contents: &str,
    encoding: Encoding,
    flush: FlushOptions,
) -> Result<(), EditError> {
    if path.exists() {
        return Err(EditError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    let bytes = encoding
        .encode(contents)
        .map_err(|source| EditError::Encoding {
            path: path.to_path_buf(),
            encoding,
            source,
        })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| EditError::io(parent, source))?;
    }
    create_new_file(path, &bytes, flush)
}

impl Engine {
    /// Whole-file read, optionally narrowed by `start`/`end`. An inverted
    /// slice reads as empty; [`ReadRequest::validate`] rejects it upfront.
    pub fn read_file(&self, request: &ReadRequest) -> Result<RangeContent, AccessError> {
        let path = self.check_path(&request.file_path)?;
        let contents = read_file(
            &path,
            request.start,
            request.end,
            self.encoding(request.encoding),
        )?;
        debug!(file = %path.display(), total_lines = contents.total_lines, "File read");
        Ok(contents)
    }

    /// Read several ranges from several files. Every path is checked before
    /// the first file is opened.
    pub fn read_ranges(&self, request: &ReadRangesRequest) -> Result<Vec<FileContents>, AccessError> {
        let paths = request
            .files
            .iter()
            .map(|file| self.check_path(&file.file_path))
            .collect::<Result<Vec<_>, _>>()?;

        let encoding = self.encoding(request.encoding);
        let mut contents = Vec::with_capacity(paths.len());
        for (file, path) in request.files.iter().zip(paths) {
            let ranges = read_ranges(&path, &file.ranges, encoding)?;
            contents.push(FileContents {
                file_path: file.file_path.clone(),
                ranges,
            });
        }
        Ok(contents)
    }

    pub fn create(&self, request: &CreateRequest) -> Result<EditOutcome, SafetyError> {
        let path = self.check_path(&request.file_path)?;
        let encoding = self.encoding(request.encoding);

        let result = if self.dry_run() {
            if path.exists() {
                Err(EditError::AlreadyExists { path: path.clone() })
            } else {
                Ok(false)
            }
        } else {
            create_file(&path, &request.contents, encoding, self.flush_options()).map(|()| true)
        };

        Ok(match result {
            Ok(written) => {
                info!(file = %path.display(), written, "File created");
                EditOutcome::Committed(Change {
                    file: path,
                    before: String::new(),
                    after: request.contents.clone(),
                    written,
                })
            }
            Err(err) => {
                warn!(file = %path.display(), reason = %err, "Create rejected");
                EditOutcome::Rejected(err)
            }
        })
    }
}
