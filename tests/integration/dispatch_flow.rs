//! Read, create, then edit through JSON tool calls.

use line_patcher::dispatch::{
    dispatch, ToolCall, ToolMode, APPEND_TEXT_FILE_CONTENTS, CREATE_TEXT_FILE,
    GET_TEXT_FILE_CONTENTS, INSERT_TEXT_FILE_CONTENTS, PATCH_TEXT_FILE_CONTENTS,
};
use line_patcher::{Engine, EngineOptions};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn call(engine: &Engine, tool: &str, arguments: Value) -> Value {
    let call = ToolCall::from_parts(tool, arguments).unwrap();
    dispatch(engine, ToolMode::All, &call).unwrap().value
}

#[test]
fn test_create_read_edit_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes/todo.txt");
    let engine = Engine::default();

    let created = call(
        &engine,
        CREATE_TEXT_FILE,
        json!({"file_path": path, "contents": "buy milk\nwalk dog\n"}),
    );
    assert_eq!(created, json!({"result": "ok"}));

    let read = call(&engine, GET_TEXT_FILE_CONTENTS, json!({"file_path": path}));
    assert_eq!(read["total_lines"], 2);
    assert_eq!(read["content"], "buy milk\nwalk dog\n");

    let inserted = call(
        &engine,
        INSERT_TEXT_FILE_CONTENTS,
        json!({
            "file_path": path,
            "insertions": [{"content_to_insert": "feed cat", "position": "before", "context_line": "walk dog", "line_number": 2}]
        }),
    );
    assert_eq!(inserted["result"], "ok");

    let appended = call(
        &engine,
        APPEND_TEXT_FILE_CONTENTS,
        json!({"file_path": path, "content_to_append": "sleep\n", "expected_file_ending": "walk dog"}),
    );
    assert_eq!(appended["result"], "ok");

    let patched = call(
        &engine,
        PATCH_TEXT_FILE_CONTENTS,
        json!({"files": [{
            "file_path": path,
            "patches": [{"old_string": "buy milk\n", "new_string": "buy oat milk\n", "ranges": [{"start": 1, "end": 1}]}]
        }]}),
    );
    assert_eq!(patched[0]["result"]["result"], "ok");

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "buy oat milk\nfeed cat\nwalk dog\nsleep\n"
    );
}

#[test]
fn test_create_twice_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("once.txt");
    let engine = Engine::default();

    call(&engine, CREATE_TEXT_FILE, json!({"file_path": path, "contents": "1\n"}));
    let second = call(&engine, CREATE_TEXT_FILE, json!({"file_path": path, "contents": "2\n"}));

    assert_eq!(second["result"], "error");
    assert_eq!(fs::read_to_string(&path).unwrap(), "1\n");
}

#[test]
fn test_dry_run_reports_change_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dry.txt");
    fs::write(&path, "x\n").unwrap();

    let engine = Engine::new(EngineOptions {
        dry_run: true,
        ..EngineOptions::default()
    });
    let tool_call = ToolCall::from_parts(
        APPEND_TEXT_FILE_CONTENTS,
        json!({"file_path": path, "content_to_append": "y\n", "expected_file_ending": "x"}),
    )
    .unwrap();
    let output = dispatch(&engine, ToolMode::All, &tool_call).unwrap();

    assert!(!output.is_error);
    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].after, "x\ny\n");
    assert!(!output.changes[0].written);
    assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
}
