use crate::config::schema::{Settings, ValidationError};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a settings file when `--config` is absent.
pub const CONFIG_ENV: &str = "LINE_PATCHER_CONFIG";

/// Who named the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Env,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Flag => write!(f, "--config"),
            ConfigSource::Env => write!(f, "${CONFIG_ENV}"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        named_by: Option<ConfigSource>,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// Record whether the unreadable path came from the flag or the environment.
    fn named_by(self, origin: ConfigSource) -> Self {
        match self {
            ConfigError::Io { path, source, .. } => ConfigError::Io {
                path,
                named_by: Some(origin),
                source,
            },
            other => other,
        }
    }
}

/// ` (path)` suffix for parse and validation messages.
struct Located<'a>(&'a Option<PathBuf>);

impl fmt::Display for Located<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, " ({})", path.display()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io {
                path,
                named_by: Some(origin),
                source,
            } => write!(
                f,
                "cannot read settings file {} named by {origin}: {source}",
                path.display()
            ),
            ConfigError::Io {
                path,
                named_by: None,
                source,
            } => write!(f, "cannot read settings file {}: {source}", path.display()),
            ConfigError::Toml { path, source } => {
                write!(f, "settings TOML does not parse{}: {source}", Located(path))
            }
            ConfigError::Validation { path, source } => {
                write!(f, "settings rejected{}:\n{source}", Located(path))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    settings
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(settings)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        named_by: None,
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Settings from `explicit`, else from `$LINE_PATCHER_CONFIG`, else defaults.
pub fn resolve(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    resolve_from(explicit, env::var_os(CONFIG_ENV))
}

fn resolve_from(
    explicit: Option<&Path>,
    env_path: Option<OsString>,
) -> Result<Settings, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path).map_err(|e| e.named_by(ConfigSource::Flag));
    }
    match env_path {
        // An empty variable counts as unset
        Some(path) if !path.is_empty() => {
            load_from_path(PathBuf::from(path)).map_err(|e| e.named_by(ConfigSource::Env))
        }
        _ => Ok(Settings::default()),
    }
}
