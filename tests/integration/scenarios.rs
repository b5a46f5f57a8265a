//! End-to-end edits on real files, one tool per test.

use super::fixture;
use line_patcher::request::{AppendRequest, DeleteRequest, FilePatch, InsertRequest};
use line_patcher::{
    AppendOperation, DeleteOperation, EditError, Engine, InsertOperation, LineRange,
    PatchOperation, Position,
};
use std::fs;

fn delete_request(path: &std::path::Path, expected: &str, range: LineRange) -> DeleteRequest {
    DeleteRequest {
        file_path: path.to_path_buf(),
        encoding: None,
        require_exact_match: None,
        deletions: vec![DeleteOperation::new(expected, vec![range])],
    }
}

#[test]
fn test_delete_matching_line() {
    let (_dir, path) = fixture("a.txt", "L1\nL2\nL3\n");

    let outcome = Engine::default()
        .delete(&delete_request(&path, "L2\n", LineRange::closed(2, 2)))
        .unwrap();

    assert!(outcome.is_committed());
    assert!(outcome.response().is_ok());
    assert_eq!(fs::read_to_string(&path).unwrap(), "L1\nL3\n");
}

#[test]
fn test_delete_mismatch_leaves_file_unchanged() {
    let (_dir, path) = fixture("a.txt", "L1\nL2\nL3\n");

    let outcome = Engine::default()
        .delete(&delete_request(&path, "WRONG\n", LineRange::closed(2, 2)))
        .unwrap();

    let response = outcome.response();
    assert!(!response.is_ok());
    assert!(response.reason.unwrap().to_lowercase().contains("mismatch"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "L1\nL2\nL3\n");
}

#[test]
fn test_insert_after_context_line() {
    let (_dir, path) = fixture("a.txt", "A\nB\n");

    let request = InsertRequest {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        insertions: vec![InsertOperation::new("X\n", Position::After, "A", 1)],
    };
    let outcome = Engine::default().insert(&request).unwrap();

    assert!(outcome.is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "A\nX\nB\n");
}

#[test]
fn test_append_after_expected_ending() {
    let (_dir, path) = fixture("a.txt", "Header\n");

    let request = AppendRequest {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        operation: AppendOperation::new("Footer\n", "Header"),
    };
    let outcome = Engine::default().append(&request).unwrap();

    assert!(outcome.is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "Header\nFooter\n");
}

#[test]
fn test_overlapping_patches_rejected() {
    let (_dir, path) = fixture("a.txt", "1\n2\n3\n4\n");

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        patches: vec![
            PatchOperation::new("1\n2\n", "one\ntwo\n", vec![LineRange::closed(1, 2)]),
            PatchOperation::new("2\n3\n", "two\nthree\n", vec![LineRange::closed(2, 3)]),
        ],
    };
    let outcome = Engine::default().patch_file(&file).unwrap();

    assert!(matches!(
        outcome.error(),
        Some(EditError::OverlappingRanges { .. })
    ));
    assert!(outcome
        .response()
        .reason
        .unwrap()
        .to_lowercase()
        .contains("overlapping ranges"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "1\n2\n3\n4\n");
}

#[test]
fn test_stale_read_is_rejected() {
    let (_dir, path) = fixture("a.txt", "alpha\nbeta\n");

    // Someone else rewrites line 2 after our read.
    fs::write(&path, "alpha\nBETA\n").unwrap();

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "beta\n",
            "gamma\n",
            vec![LineRange::closed(2, 2)],
        )],
    };
    let outcome = Engine::default().patch_file(&file).unwrap();

    assert!(!outcome.is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "alpha\nBETA\n");
}

#[test]
fn test_flexible_match_ignores_trailing_whitespace() {
    let (_dir, path) = fixture("a.txt", "keep\nold   \n");

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "old\n",
            "new\n",
            vec![LineRange::closed(2, 2)],
        )],
    };
    assert!(Engine::default().patch_file(&file).unwrap().is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep\nnew\n");
}

#[test]
fn test_exact_match_reports_mode_in_hint() {
    let (_dir, path) = fixture("a.txt", "keep\nold   \n");

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: Some(true),
        patches: vec![PatchOperation::new(
            "old\n",
            "new\n",
            vec![LineRange::closed(2, 2)],
        )],
    };
    let response = Engine::default().patch_file(&file).unwrap().response();

    assert!(!response.is_ok());
    assert!(response.hint.unwrap().contains("exact whitespace match required"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep\nold   \n");
}

#[test]
fn test_out_of_bounds_range_rejected() {
    let (_dir, path) = fixture("a.txt", "only\n");

    let outcome = Engine::default()
        .delete(&delete_request(&path, "x\n", LineRange::closed(2, 3)))
        .unwrap();

    assert!(matches!(
        outcome.error(),
        Some(EditError::RangeOutOfBounds { total_lines: 1, .. })
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "only\n");
}

#[test]
fn test_crlf_file_keeps_its_terminators() {
    let (_dir, path) = fixture("win.txt", "a\r\nb\r\nc\r\n");

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "b\r\n",
            "B",
            vec![LineRange::closed(2, 2)],
        )],
    };
    assert!(Engine::default().patch_file(&file).unwrap().is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\r\nB\r\nc\r\n");
}

#[test]
fn test_delete_then_insert_restores_file() {
    let original = "L1\nL2\nL3\n";
    let (_dir, path) = fixture("a.txt", original);
    let engine = Engine::default();

    let deleted = engine
        .delete(&delete_request(&path, "L2\n", LineRange::closed(2, 2)))
        .unwrap();
    assert!(deleted.is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "L1\nL3\n");

    let request = InsertRequest {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        insertions: vec![InsertOperation::new("L2\n", Position::Before, "L3", 2)],
    };
    let inserted = engine.insert(&request).unwrap();

    assert!(inserted.is_committed());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_identity_patch_leaves_file_untouched() {
    let (_dir, path) = fixture("a.txt", "a\nlast");
    let old_mtime = filetime::FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(&path, old_mtime).unwrap();

    let file = FilePatch {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "last",
            "last",
            vec![LineRange::closed(2, 2)],
        )],
    };
    let outcome = Engine::default().patch_file(&file).unwrap();

    assert!(outcome.is_committed());
    assert!(!outcome.change().unwrap().written);
    assert_eq!(fs::read(&path).unwrap(), b"a\nlast");
    let mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
    assert_eq!(mtime, old_mtime);
}
