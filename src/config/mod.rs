pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, resolve, ConfigError, ConfigSource, CONFIG_ENV};
pub use schema::{
    EngineSettings, LoggingSettings, Settings, ToolSettings, ValidationError, ValidationIssue,
};
