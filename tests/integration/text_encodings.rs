//! Files are decoded and re-encoded in the caller's encoding.

use super::fixture;
use line_patcher::request::{DeleteRequest, FilePatch, ReadRequest};
use line_patcher::{DeleteOperation, EditError, Encoding, Engine, LineRange, PatchOperation};
use std::fs;

#[test]
fn test_latin1_patch_roundtrip() {
    let (_dir, path) = fixture("l1.txt", "");
    fs::write(&path, b"caf\xe9\nna\xefve\n").unwrap();

    let file = FilePatch {
        file_path: path.clone(),
        encoding: Some(Encoding::Latin1),
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "na\u{ef}ve\n",
            "r\u{e9}sum\u{e9}\n",
            vec![LineRange::single(2)],
        )],
    };
    assert!(Engine::default().patch_file(&file).unwrap().is_committed());
    assert_eq!(fs::read(&path).unwrap(), b"caf\xe9\nr\xe9sum\xe9\n");
}

#[test]
fn test_invalid_utf8_is_reported_not_written() {
    let (_dir, path) = fixture("bin.txt", "");
    fs::write(&path, b"ok\n\xff\n").unwrap();

    let request = DeleteRequest {
        file_path: path.clone(),
        encoding: None,
        require_exact_match: None,
        deletions: vec![DeleteOperation::new("ok\n", vec![LineRange::single(1)])],
    };
    let outcome = Engine::default().delete(&request).unwrap();

    assert!(matches!(outcome.error(), Some(EditError::Encoding { .. })));
    assert_eq!(fs::read(&path).unwrap(), b"ok\n\xff\n");
}

#[test]
fn test_ascii_rejects_unencodable_replacement() {
    let (_dir, path) = fixture("a.txt", "plain\n");

    let file = FilePatch {
        file_path: path.clone(),
        encoding: Some(Encoding::Ascii),
        require_exact_match: None,
        patches: vec![PatchOperation::new(
            "plain\n",
            "fanc\u{ff}\n",
            vec![LineRange::single(1)],
        )],
    };
    let outcome = Engine::default().patch_file(&file).unwrap();

    assert!(matches!(outcome.error(), Some(EditError::Encoding { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), "plain\n");
}

#[test]
fn test_read_reports_encoded_size() {
    let (_dir, path) = fixture("u.txt", "\u{e9}t\u{e9}\n");

    let request = ReadRequest {
        file_path: path,
        start: None,
        end: None,
        encoding: None,
    };
    let contents = Engine::default().read_file(&request).unwrap();
    assert_eq!(contents.content_size, 6);
    assert_eq!(contents.total_lines, 1);
}
