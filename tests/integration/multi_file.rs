//! Multi-file patch requests commit each file on its own.

use line_patcher::request::{FilePatch, PatchRequest};
use line_patcher::{EditError, Engine, LineRange, PatchOperation, SafetyError};
use std::fs;
use tempfile::TempDir;

fn patch(path: std::path::PathBuf, old: &str, new: &str, line: usize) -> FilePatch {
    FilePatch {
        file_path: path,
        encoding: None,
        require_exact_match: None,
        patches: vec![PatchOperation::new(old, new, vec![LineRange::single(line)])],
    }
}

#[test]
fn test_second_file_failure_keeps_first_file_written() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    fs::write(&first, "a\nb\n").unwrap();
    fs::write(&second, "c\nd\n").unwrap();

    let request = PatchRequest {
        files: vec![
            patch(first.clone(), "b\n", "B\n", 2),
            patch(second.clone(), "nope\n", "D\n", 2),
        ],
    };
    let outcomes = Engine::default().patch_files(&request).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].outcome.is_committed());
    assert!(matches!(
        outcomes[1].outcome.error(),
        Some(EditError::ContentMismatch { .. })
    ));
    assert_eq!(fs::read_to_string(&first).unwrap(), "a\nB\n");
    assert_eq!(fs::read_to_string(&second).unwrap(), "c\nd\n");
}

#[test]
fn test_unsafe_path_anywhere_aborts_before_io() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.txt");
    fs::write(&first, "a\n").unwrap();

    let request = PatchRequest {
        files: vec![
            patch(first.clone(), "a\n", "A\n", 1),
            patch("relative.txt".into(), "x\n", "y\n", 1),
        ],
    };
    let err = Engine::default().patch_files(&request).unwrap_err();

    assert!(matches!(err, SafetyError::NotAbsolute(_)));
    assert_eq!(fs::read_to_string(&first).unwrap(), "a\n");
}

#[test]
fn test_missing_file_suggests_create() {
    let dir = TempDir::new().unwrap();
    let request = PatchRequest {
        files: vec![patch(dir.path().join("ghost.txt"), "", "x\n", 1)],
    };
    let outcomes = Engine::default().patch_files(&request).unwrap();
    let response = outcomes[0].outcome.response();

    assert_eq!(response.suggestion.as_deref(), Some("create_text_file"));
}
