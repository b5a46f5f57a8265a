use crate::error::EditError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Ok,
    Error,
}

/// Uniform success/failure envelope returned for every file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditResponse {
    pub result: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl EditResponse {
    pub fn ok() -> Self {
        Self {
            result: ResultKind::Ok,
            reason: None,
            hint: None,
            suggestion: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == ResultKind::Ok
    }
}

impl From<&EditError> for EditResponse {
    fn from(err: &EditError) -> Self {
        Self {
            result: ResultKind::Error,
            reason: Some(err.to_string()),
            hint: err.hint(),
            suggestion: err.suggestion().map(str::to_string),
        }
    }
}

impl fmt::Display for EditResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.result, &self.reason) {
            (ResultKind::Ok, _) => write!(f, "ok"),
            (ResultKind::Error, Some(reason)) => write!(f, "error: {reason}"),
            (ResultKind::Error, None) => write!(f, "error"),
        }
    }
}
