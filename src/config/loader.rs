//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "farmerice.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is read
/// if present and built-in defaults are used otherwise. Environment variables
/// are applied last.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                read_file(fallback)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests never touch process state.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("NODE_ENV") {
        config.environment = value.parse().unwrap_or(Environment::Development);
    }
    if let Some(value) = lookup("PORT") {
        config.server.port = parse("PORT", value)?;
    }
    if let Some(value) = lookup("DATABASE_URL") {
        config.database.url = value;
    }
    if let Some(value) = lookup("CORS_ORIGIN") {
        config.cors.allowed_origins = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(value) = lookup("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse("RATE_LIMIT_MAX", value)?;
    }
    if let Some(value) = lookup("RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit.window_secs = parse("RATE_LIMIT_WINDOW_SECS", value)?;
    }
    if let Some(value) = lookup("UPLOADS_DIR") {
        config.static_files.uploads_dir = PathBuf::from(value);
    }
    if let Some(value) = lookup("FRONTEND_DIR") {
        config.static_files.frontend_dir = Some(PathBuf::from(value));
    }

    Ok(())
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
