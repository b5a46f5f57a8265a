//! Integration tests driving the engine through its public API.

mod dispatch_flow;
mod multi_file;
mod scenarios;
mod text_encodings;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temp dir holding one file with `contents`.
pub fn fixture(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    (dir, path)
}
