use crate::dispatch::ToolMode;
use crate::document::FlushOptions;
use crate::encoding::Encoding;
use crate::engine::{Engine, EngineOptions};
use crate::safety::{SafetyError, WorkspaceGuard};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub default_encoding: Encoding,
    pub require_exact_match: bool,
    pub atomic_writes: bool,
    pub touch_mtime: bool,
    /// Confine every path below this directory
    pub workspace_root: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_encoding: Encoding::default(),
            require_exact_match: false,
            atomic_writes: true,
            touch_mtime: true,
            workspace_root: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directives, e.g. `info` or `warn,line_patcher=debug`;
    /// `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    pub mode: ToolMode,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Some(root) = &self.engine.workspace_root {
            if !root.is_absolute() {
                issues.push(ValidationIssue::RelativeWorkspaceRoot(root.clone()));
            }
        }

        if let Err(e) = self.logging.filter() {
            issues.push(ValidationIssue::InvalidLogFilter {
                directives: self.logging.level.clone(),
                message: e.to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn engine_options(&self, dry_run: bool) -> EngineOptions {
        EngineOptions {
            default_encoding: self.engine.default_encoding,
            require_exact_match: self.engine.require_exact_match,
            flush: FlushOptions {
                atomic: self.engine.atomic_writes,
                touch_mtime: self.engine.touch_mtime,
            },
            dry_run,
        }
    }

    /// Build an engine, confined to the workspace root when one is set.
    pub fn engine(&self, dry_run: bool) -> Result<Engine, SafetyError> {
        let engine = Engine::new(self.engine_options(dry_run));
        match &self.engine.workspace_root {
            Some(root) => {
                let guard = WorkspaceGuard::new(root)?;
                debug!(workspace = %guard.workspace_root().display(), "Paths confined to workspace");
                Ok(engine.with_workspace(guard))
            }
            None => Ok(engine),
        }
    }
}

impl LoggingSettings {
    /// Parse `level` into a filter.
    pub fn filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_new(self.level.trim())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    RelativeWorkspaceRoot(PathBuf),
    InvalidLogFilter { directives: String, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::RelativeWorkspaceRoot(path) => write!(
                f,
                "engine.workspace_root must be an absolute path, got '{}'",
                path.display()
            ),
            ValidationIssue::InvalidLogFilter {
                directives,
                message,
            } => write!(f, "logging.level '{directives}' is not a valid filter: {message}"),
        }
    }
}
