//! Line ranges and batch validation.
//!
//! A [`LineRange`] is an inclusive, 1-based interval of lines whose end may
//! be left open to mean "through the last line". Before any content is
//! compared, every range of a batch is checked against the document length
//! and against every other range of the batch. Open ends are resolved to the
//! document's line count for that check, so a range running to EOF collides
//! with any range below its start.

use crate::error::{EditError, OverlapScope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-based, inclusive)
    pub start: usize,
    /// Last line (inclusive); `None` runs to the end of the document
    #[serde(default)]
    pub end: Option<usize>,
}

/// A range with its end resolved against a concrete document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn single(line: usize) -> Self {
        Self::closed(line, line)
    }

    pub fn to_eof(start: usize) -> Self {
        Self { start, end: None }
    }

    /// End used when two ranges are compared without a document.
    pub fn effective_end(&self) -> usize {
        self.end.unwrap_or(self.start)
    }

    /// Document-free overlap test. An open end counts as the start line.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.effective_end() && self.effective_end() >= other.start
    }

    pub fn resolve(&self, total_lines: usize) -> LineSpan {
        LineSpan {
            start: self.start,
            end: self.end.unwrap_or(total_lines),
        }
    }

    /// Check the range against a document of `total_lines` lines.
    pub fn check_bounds(&self, total_lines: usize) -> Result<LineSpan, EditError> {
        let out_of_bounds = self.start < 1
            || self.start > total_lines
            || self
                .end
                .is_some_and(|end| end < self.start || end > total_lines);

        if out_of_bounds {
            return Err(EditError::RangeOutOfBounds {
                range: *self,
                total_lines,
            });
        }
        Ok(self.resolve(total_lines))
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-EOF", self.start),
        }
    }
}

impl LineSpan {
    pub fn overlaps(&self, other: &LineSpan) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Zero-based, end-exclusive index range into a line buffer.
    pub fn indices(&self) -> Range<usize> {
        self.start - 1..self.end
    }
}

/// Validate the pooled ranges of a batch.
///
/// `batch[i]` holds the ranges of operation `i`. Bounds are checked first,
/// then overlap within each operation, then overlap across operations. The
/// first violation wins. On success the resolved spans are returned in the
/// same shape as the input.
pub fn validate_batch(
    batch: &[&[LineRange]],
    total_lines: usize,
) -> Result<Vec<Vec<LineSpan>>, EditError> {
    let spans = batch
        .iter()
        .map(|ranges| {
            ranges
                .iter()
                .map(|range| range.check_bounds(total_lines))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (op, op_spans) in spans.iter().enumerate() {
        for i in 0..op_spans.len() {
            for j in i + 1..op_spans.len() {
                if op_spans[i].overlaps(&op_spans[j]) {
                    return Err(EditError::OverlappingRanges {
                        scope: OverlapScope::WithinOperation { operation: op },
                        first: batch[op][i],
                        second: batch[op][j],
                    });
                }
            }
        }
    }

    for a in 0..spans.len() {
        for b in a + 1..spans.len() {
            for (i, left) in spans[a].iter().enumerate() {
                for (j, right) in spans[b].iter().enumerate() {
                    if left.overlaps(right) {
                        return Err(EditError::OverlappingRanges {
                            scope: OverlapScope::AcrossOperations {
                                first: a,
                                second: b,
                            },
                            first: batch[a][i],
                            second: batch[b][j],
                        });
                    }
                }
            }
        }
    }

    Ok(spans)
}
