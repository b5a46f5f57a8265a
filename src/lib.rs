//! Line Patcher: line-addressed text edits with optimistic conflict checks
//!
//! Callers address lines by 1-based number and state what they expect to
//! find there. Every edit re-reads the file, checks that expectation and
//! only then rewrites it, so an edit built from a stale read is rejected
//! instead of clobbering someone else's change.
//!
//! # Architecture
//!
//! All mutations run through one pipeline in [`Engine`]: load a
//! [`Document`], validate the batch of ranges, match expected content against
//! the untouched buffer, splice bottom-to-top, flush. Tool calls
//! ([`dispatch::ToolCall`]) are thin typed wrappers around that pipeline.
//!
//! # Safety
//!
//! - Expected content is checked at every addressed range before anything
//!   changes
//! - A rejected call leaves the file byte-identical
//! - Atomic file writes (tempfile + fsync + rename)
//! - Relative paths and `..` components are rejected before any I/O
//! - Optional workspace boundary enforcement
//!
//! # Example
//!
//! ```no_run
//! use line_patcher::{Engine, LineRange, PatchOperation};
//! use line_patcher::request::FilePatch;
//! use std::path::PathBuf;
//!
//! let file = FilePatch {
//!     file_path: PathBuf::from("/srv/notes.txt"),
//!     encoding: None,
//!     require_exact_match: None,
//!     patches: vec![PatchOperation::new(
//!         "old line\n",
//!         "new line\n",
//!         vec![LineRange::closed(3, 3)],
//!     )],
//! };
//!
//! match Engine::default().patch_file(&file) {
//!     Ok(outcome) => println!("{}", outcome.response()),
//!     Err(e) => eprintln!("Refused: {}", e),
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod document;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod ops;
pub mod range;
pub mod read;
pub mod request;
pub mod response;
pub mod safety;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, Settings};
pub use dispatch::{dispatch, DispatchError, ToolCall, ToolMode, ToolOutput};
pub use document::{Document, FlushOptions, LineEnding};
pub use encoding::{Encoding, EncodingError};
pub use engine::{
    apply_append, apply_deletions, apply_insertions, apply_patches, Change, EditOutcome, Engine,
    EngineOptions, FileOutcome,
};
pub use error::{EditError, MismatchSite, OverlapScope};
pub use matcher::{content_matches, MatchMode};
pub use ops::{AppendOperation, DeleteOperation, InsertOperation, PatchOperation, Position};
pub use range::{validate_batch, LineRange, LineSpan};
pub use read::{create_file, read_file, read_ranges, AccessError, FileContents, RangeContent};
pub use response::{EditResponse, ResultKind};
pub use safety::{check_file_path, SafetyError, WorkspaceGuard};
