//! Tool-call routing: JSON arguments in, JSON responses out.
//!
//! Precondition failures (unknown tool, malformed arguments, unsafe path)
//! surface as [`DispatchError`]. Everything past the precondition line comes
//! back as a response envelope inside [`ToolOutput`].

use crate::engine::{Change, EditOutcome, Engine};
use crate::read::AccessError;
use crate::request::{
    AppendRequest, CreateRequest, DeleteRequest, InsertRequest, PatchRequest, ReadRangesRequest,
    ReadRequest, RequestError,
};
use crate::response::EditResponse;
use crate::safety::SafetyError;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const GET_TEXT_FILE_CONTENTS: &str = "get_text_file_contents";
pub const READ_TEXT_FILE_RANGES: &str = "read_text_file_ranges";
pub const CREATE_TEXT_FILE: &str = "create_text_file";
pub const PATCH_TEXT_FILE_CONTENTS: &str = "patch_text_file_contents";
pub const DELETE_TEXT_FILE_CONTENTS: &str = "delete_text_file_contents";
pub const INSERT_TEXT_FILE_CONTENTS: &str = "insert_text_file_contents";
pub const APPEND_TEXT_FILE_CONTENTS: &str = "append_text_file_contents";

/// Every tool, in listing order.
pub const TOOL_NAMES: [&str; 7] = [
    GET_TEXT_FILE_CONTENTS,
    READ_TEXT_FILE_RANGES,
    CREATE_TEXT_FILE,
    PATCH_TEXT_FILE_CONTENTS,
    DELETE_TEXT_FILE_CONTENTS,
    INSERT_TEXT_FILE_CONTENTS,
    APPEND_TEXT_FILE_CONTENTS,
];

/// Which tools a session exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolMode {
    #[default]
    All,
    /// Patch only; the other tools are hidden
    #[serde(alias = "claude-code")]
    PatchOnly,
}

impl ToolMode {
    pub fn exposes(self, tool: &str) -> bool {
        match self {
            ToolMode::All => TOOL_NAMES.contains(&tool),
            ToolMode::PatchOnly => tool == PATCH_TEXT_FILE_CONTENTS,
        }
    }

    pub fn tools(self) -> Vec<&'static str> {
        TOOL_NAMES
            .iter()
            .copied()
            .filter(|tool| self.exposes(tool))
            .collect()
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolMode::All => write!(f, "all"),
            ToolMode::PatchOnly => write!(f, "patch-only"),
        }
    }
}

impl FromStr for ToolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ToolMode::All),
            "patch-only" | "patch_only" | "claude-code" => Ok(ToolMode::PatchOnly),
            other => Err(format!(
                "unknown tool mode '{other}' (expected 'all' or 'patch-only')"
            )),
        }
    }
}

/// One decoded tool invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    GetTextFileContents(ReadRequest),
    ReadTextFileRanges(ReadRangesRequest),
    CreateTextFile(CreateRequest),
    PatchTextFileContents(PatchRequest),
    DeleteTextFileContents(DeleteRequest),
    InsertTextFileContents(InsertRequest),
    AppendTextFileContents(AppendRequest),
}

impl ToolCall {
    /// Decode `arguments` for the tool called `name`.
    pub fn from_parts(name: &str, arguments: Value) -> Result<Self, DispatchError> {
        if !TOOL_NAMES.contains(&name) {
            return Err(DispatchError::UnknownTool(name.to_string()));
        }
        serde_json::from_value(json!({ "tool": name, "arguments": arguments })).map_err(
            |source| DispatchError::InvalidArguments {
                tool: name.to_string(),
                source,
            },
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetTextFileContents(_) => GET_TEXT_FILE_CONTENTS,
            ToolCall::ReadTextFileRanges(_) => READ_TEXT_FILE_RANGES,
            ToolCall::CreateTextFile(_) => CREATE_TEXT_FILE,
            ToolCall::PatchTextFileContents(_) => PATCH_TEXT_FILE_CONTENTS,
            ToolCall::DeleteTextFileContents(_) => DELETE_TEXT_FILE_CONTENTS,
            ToolCall::InsertTextFileContents(_) => INSERT_TEXT_FILE_CONTENTS,
            ToolCall::AppendTextFileContents(_) => APPEND_TEXT_FILE_CONTENTS,
        }
    }

    fn validate(&self) -> Result<(), RequestError> {
        match self {
            ToolCall::GetTextFileContents(request) => request.validate(),
            ToolCall::ReadTextFileRanges(request) => request.validate(),
            ToolCall::CreateTextFile(_) | ToolCall::AppendTextFileContents(_) => Ok(()),
            ToolCall::PatchTextFileContents(request) => request.validate(),
            ToolCall::DeleteTextFileContents(request) => request.validate(),
            ToolCall::InsertTextFileContents(request) => request.validate(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' is not available in {mode} mode")]
    NotAvailable { tool: String, mode: ToolMode },

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request:\n{0}")]
    Request(#[from] RequestError),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// Result of one tool call.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub value: Value,
    /// Files the call created or modified (or would have, when running dry)
    pub changes: Vec<Change>,
    pub is_error: bool,
}

impl ToolOutput {
    fn read(value: Value) -> Self {
        Self {
            value,
            changes: Vec::new(),
            is_error: false,
        }
    }

    fn rejected(response: EditResponse) -> Self {
        Self {
            value: to_value(&response),
            changes: Vec::new(),
            is_error: true,
        }
    }

    fn edit(outcome: EditOutcome) -> Self {
        let response = outcome.response();
        let is_error = !response.is_ok();
        let changes = match outcome {
            EditOutcome::Committed(change) if !change.is_noop() => vec![change],
            _ => Vec::new(),
        };
        Self {
            value: to_value(&response),
            changes,
            is_error,
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "result": "error", "reason": e.to_string() }))
}

fn read_output<T: serde::Serialize>(result: Result<T, AccessError>) -> Result<ToolOutput, DispatchError> {
    match result {
        Ok(contents) => Ok(ToolOutput::read(to_value(&contents))),
        Err(AccessError::Safety(err)) => Err(err.into()),
        Err(AccessError::Edit(err)) => Ok(ToolOutput::rejected(EditResponse::from(&err))),
    }
}

/// Run `call` on `engine` if `mode` exposes it.
pub fn dispatch(engine: &Engine, mode: ToolMode, call: &ToolCall) -> Result<ToolOutput, DispatchError> {
    if !mode.exposes(call.name()) {
        return Err(DispatchError::NotAvailable {
            tool: call.name().to_string(),
            mode,
        });
    }
    call.validate()?;
    debug!(tool = call.name(), "Dispatching tool call");

    match call {
        ToolCall::GetTextFileContents(request) => read_output(engine.read_file(request)),
        ToolCall::ReadTextFileRanges(request) => {
            let files = match engine.read_ranges(request) {
                Ok(files) => files,
                Err(err) => return read_output::<()>(Err(err)),
            };
            let mut map = Map::new();
            for file in files {
                map.insert(
                    file.file_path.display().to_string(),
                    json!({ "ranges": to_value(&file.ranges) }),
                );
            }
            Ok(ToolOutput::read(Value::Object(map)))
        }
        ToolCall::CreateTextFile(request) => Ok(ToolOutput::edit(engine.create(request)?)),
        ToolCall::PatchTextFileContents(request) => {
            let outcomes = engine.patch_files(request)?;
            let mut results = Vec::with_capacity(outcomes.len());
            let mut changes = Vec::new();
            let mut is_error = false;
            for file in outcomes {
                let response = file.outcome.response();
                is_error |= !response.is_ok();
                results.push(json!({
                    "file_path": file.file_path.display().to_string(),
                    "result": to_value(&response),
                }));
                if let EditOutcome::Committed(change) = file.outcome {
                    if !change.is_noop() {
                        changes.push(change);
                    }
                }
            }
            Ok(ToolOutput {
                value: Value::Array(results),
                changes,
                is_error,
            })
        }
        ToolCall::DeleteTextFileContents(request) => Ok(ToolOutput::edit(engine.delete(request)?)),
        ToolCall::InsertTextFileContents(request) => Ok(ToolOutput::edit(engine.insert(request)?)),
        ToolCall::AppendTextFileContents(request) => Ok(ToolOutput::edit(engine.append(request)?)),
    }
}
