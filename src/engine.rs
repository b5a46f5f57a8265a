//! Mutation engine - verified, line-addressed edits of one file at a time
//!
//! Every call walks the same states:
//! - load the file into a [`Document`]
//! - validate the pooled ranges of the whole batch
//! - check expected content at every range against the untouched buffer
//! - apply the mutations bottom-to-top so pending line numbers stay valid
//! - flush the buffer back in the encoding it was loaded with
//!
//! A failure in any state rejects the call and the file stays byte-identical.
//! There is no lock: between load and flush another writer can still change
//! the file, and the expected-content check is the only guard against it.

use crate::document::{Document, FlushOptions};
use crate::encoding::Encoding;
use crate::error::{EditError, MismatchSite};
use crate::matcher::{line_matches, MatchMode};
use crate::ops::{AppendOperation, DeleteOperation, InsertOperation, PatchOperation};
use crate::range::{validate_batch, LineRange};
use crate::request::{AppendRequest, DeleteRequest, FilePatch, InsertRequest, PatchRequest};
use crate::response::EditResponse;
use crate::safety::{check_file_path, SafetyError, WorkspaceGuard};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Defaults applied when a request leaves a field out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    pub default_encoding: Encoding,
    pub require_exact_match: bool,
    pub flush: FlushOptions,
    /// Compute every change but never write it
    pub dry_run: bool,
}

/// Stateless edit engine. Holds configuration only, so one value can serve
/// any number of calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
    guard: Option<WorkspaceGuard>,
}

/// Before/after text of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub file: PathBuf,
    pub before: String,
    pub after: String,
    /// False when nothing changed or the engine runs dry
    pub written: bool,
}

impl Change {
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

#[derive(Debug)]
#[must_use = "EditOutcome should be checked for commit/rejection"]
pub enum EditOutcome {
    Committed(Change),
    Rejected(EditError),
}

impl EditOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, EditOutcome::Committed(_))
    }

    pub fn change(&self) -> Option<&Change> {
        match self {
            EditOutcome::Committed(change) => Some(change),
            EditOutcome::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EditError> {
        match self {
            EditOutcome::Committed(_) => None,
            EditOutcome::Rejected(err) => Some(err),
        }
    }

    pub fn response(&self) -> EditResponse {
        match self {
            EditOutcome::Committed(_) => EditResponse::ok(),
            EditOutcome::Rejected(err) => EditResponse::from(err),
        }
    }
}

/// Outcome for one entry of a multi-file patch request.
#[derive(Debug)]
pub struct FileOutcome {
    pub file_path: PathBuf,
    pub outcome: EditOutcome,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            guard: None,
        }
    }

    /// Confine every path to `guard`'s workspace.
    pub fn with_workspace(mut self, guard: WorkspaceGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Path preconditions, checked before any I/O.
    pub fn check_path(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        match &self.guard {
            Some(guard) => guard.validate_path(path),
            None => {
                check_file_path(path)?;
                Ok(path.to_path_buf())
            }
        }
    }

    pub(crate) fn encoding(&self, requested: Option<Encoding>) -> Encoding {
        requested.unwrap_or(self.options.default_encoding)
    }

    fn match_mode(&self, requested: Option<bool>) -> MatchMode {
        MatchMode::from_exact_flag(requested.unwrap_or(self.options.require_exact_match))
    }

    pub(crate) fn flush_options(&self) -> FlushOptions {
        self.options.flush
    }

    pub(crate) fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Patch a single file.
    pub fn patch_file(&self, file: &FilePatch) -> Result<EditOutcome, SafetyError> {
        let path = self.check_path(&file.file_path)?;
        let mode = self.match_mode(file.require_exact_match);
        Ok(self.commit(&path, self.encoding(file.encoding), true, |doc| {
            apply_patches(doc, &file.patches, mode)
        }))
    }

    /// Patch every file of `request` in order.
    ///
    /// All paths are checked up front. After that each file is committed on
    /// its own: a rejection for one file does not undo files already written.
    pub fn patch_files(&self, request: &PatchRequest) -> Result<Vec<FileOutcome>, SafetyError> {
        for file in &request.files {
            self.check_path(&file.file_path)?;
        }

        let mut outcomes = Vec::with_capacity(request.files.len());
        for file in &request.files {
            outcomes.push(FileOutcome {
                file_path: file.file_path.clone(),
                outcome: self.patch_file(file)?,
            });
        }
        Ok(outcomes)
    }

    pub fn delete(&self, request: &DeleteRequest) -> Result<EditOutcome, SafetyError> {
        let path = self.check_path(&request.file_path)?;
        let mode = self.match_mode(request.require_exact_match);
        Ok(self.commit(&path, self.encoding(request.encoding), false, |doc| {
            apply_deletions(doc, &request.deletions, mode)
        }))
    }

    pub fn insert(&self, request: &InsertRequest) -> Result<EditOutcome, SafetyError> {
        let path = self.check_path(&request.file_path)?;
        let mode = self.match_mode(request.require_exact_match);
        Ok(self.commit(&path, self.encoding(request.encoding), false, |doc| {
            apply_insertions(doc, &request.insertions, mode)
        }))
    }

    pub fn append(&self, request: &AppendRequest) -> Result<EditOutcome, SafetyError> {
        let path = self.check_path(&request.file_path)?;
        let mode = self.match_mode(request.require_exact_match);
        Ok(self.commit(&path, self.encoding(request.encoding), false, |doc| {
            apply_append(doc, &request.operation, mode)
        }))
    }

    /// Load, mutate in memory, flush. Nothing is written unless `mutate`
    /// succeeds and the text actually changed.
    fn commit<F>(
        &self,
        path: &Path,
        encoding: Encoding,
        suggest_create: bool,
        mutate: F,
    ) -> EditOutcome
    where
        F: FnOnce(&mut Document) -> Result<(), EditError>,
    {
        let result = self.load_mutate_flush(path, encoding, mutate);
        match result {
            Ok(change) => {
                info!(
                    file = %path.display(),
                    written = change.written,
                    dry_run = self.options.dry_run,
                    "Edit committed"
                );
                EditOutcome::Committed(change)
            }
            Err(err) => {
                let err = match err {
                    EditError::NotFound { path, .. } => EditError::NotFound {
                        path,
                        suggest_create,
                    },
                    other => other,
                };
                warn!(file = %path.display(), reason = %err, "Edit rejected");
                EditOutcome::Rejected(err)
            }
        }
    }

    fn load_mutate_flush<F>(
        &self,
        path: &Path,
        encoding: Encoding,
        mutate: F,
    ) -> Result<Change, EditError>
    where
        F: FnOnce(&mut Document) -> Result<(), EditError>,
    {
        let mut doc = Document::load(path, encoding)?;
        debug!(
            file = %path.display(),
            lines = doc.line_count(),
            %encoding,
            line_ending = ?doc.line_ending(),
            "Document loaded"
        );

        let before = doc.to_text();
        run_guarded(|| mutate(&mut doc))?;
        let after = doc.to_text();

        let written = before != after && !self.options.dry_run;
        if written {
            doc.flush(path, self.options.flush)?;
            debug!(file = %path.display(), lines = doc.line_count(), "Document flushed");
        }

        Ok(Change {
            file: path.to_path_buf(),
            before,
            after,
            written,
        })
    }
}

/// Run an in-memory mutation, turning a panic into [`EditError::Unexpected`].
fn run_guarded<F>(f: F) -> Result<(), EditError>
where
    F: FnOnce() -> Result<(), EditError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "edit panicked".to_string());
            Err(EditError::Unexpected(message))
        }
    }
}

/// Ranges of one operation plus what to check and what to put there.
/// A `None` replacement deletes the lines.
struct RangeEdit<'a> {
    ranges: &'a [LineRange],
    expected: &'a str,
    replacement: Option<&'a str>,
}

fn apply_range_edits(
    doc: &mut Document,
    edits: &[RangeEdit<'_>],
    mode: MatchMode,
) -> Result<(), EditError> {
    let batch: Vec<&[LineRange]> = edits.iter().map(|edit| edit.ranges).collect();
    let spans = validate_batch(&batch, doc.line_count())?;

    // Every range is checked against the untouched buffer before any splice.
    let mut splices = Vec::new();
    for (edit, op_spans) in edits.iter().zip(&spans) {
        for (range, span) in edit.ranges.iter().zip(op_spans) {
            let actual = doc.slice(span.indices());
            if !mode.matches(&actual, edit.expected) {
                return Err(EditError::ContentMismatch {
                    site: MismatchSite::Lines(*range),
                    mode,
                });
            }

            let replacement = match edit.replacement {
                None => Vec::new(),
                // Already in place
                Some(new) if new == actual => continue,
                Some(new) => doc.normalize_block(new),
            };
            splices.push((span.indices(), replacement));
        }
    }

    // Bottom-to-top so every pending span keeps its line numbers.
    splices.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (indices, replacement) in splices {
        doc.splice(indices, replacement);
    }
    Ok(())
}

/// Replace the content at every range of every operation.
pub fn apply_patches(
    doc: &mut Document,
    patches: &[PatchOperation],
    mode: MatchMode,
) -> Result<(), EditError> {
    let edits: Vec<RangeEdit<'_>> = patches
        .iter()
        .map(|patch| RangeEdit {
            ranges: &patch.ranges,
            expected: &patch.old_string,
            replacement: Some(&patch.new_string),
        })
        .collect();
    apply_range_edits(doc, &edits, mode)
}

/// Remove the lines at every range of every operation.
pub fn apply_deletions(
    doc: &mut Document,
    deletions: &[DeleteOperation],
    mode: MatchMode,
) -> Result<(), EditError> {
    let edits: Vec<RangeEdit<'_>> = deletions
        .iter()
        .map(|deletion| RangeEdit {
            ranges: &deletion.ranges,
            expected: &deletion.expected_content,
            replacement: None,
        })
        .collect();
    apply_range_edits(doc, &edits, mode)
}

/// Insert content next to reference lines.
///
/// Every reference line is checked first. Insertions then run from the
/// highest target index down; insertions sharing an index keep their
/// request order in the output.
pub fn apply_insertions(
    doc: &mut Document,
    insertions: &[InsertOperation],
    mode: MatchMode,
) -> Result<(), EditError> {
    let total_lines = doc.line_count();
    for insertion in insertions {
        let line = insertion.line_number;
        if line < 1 || line > total_lines {
            return Err(EditError::RangeOutOfBounds {
                range: LineRange::single(line),
                total_lines,
            });
        }
        if !line_matches(&doc.lines()[line - 1], &insertion.context_line, mode) {
            return Err(EditError::ContentMismatch {
                site: MismatchSite::Line(line),
                mode,
            });
        }
    }

    let mut order: Vec<(usize, &InsertOperation)> = insertions.iter().enumerate().collect();
    order.sort_by(|(i, a), (j, b)| {
        b.target_index()
            .cmp(&a.target_index())
            .then_with(|| j.cmp(i))
    });

    for (_, insertion) in order {
        let index = insertion.target_index();
        if index == doc.line_count() {
            doc.terminate_last_line();
        }
        let lines = doc.normalize_block(&insertion.content_to_insert);
        doc.insert_lines(index, lines);
    }
    Ok(())
}

/// Append content after checking the current last line. An empty document
/// accepts any expected ending.
pub fn apply_append(
    doc: &mut Document,
    append: &AppendOperation,
    mode: MatchMode,
) -> Result<(), EditError> {
    if let Some(last) = doc.last_line() {
        if !line_matches(last, &append.expected_file_ending, mode) {
            return Err(EditError::ContentMismatch {
                site: MismatchSite::FileEnding,
                mode,
            });
        }
    }

    let lines = doc.normalize_block(&append.content_to_append);
    doc.append_lines(lines);
    Ok(())
}
