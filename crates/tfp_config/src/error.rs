//! Error types for configuration handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or interpreting configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node pool {pool}: {message}")]
    InvalidNodepool { pool: String, message: String },

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Provider {0} not found")]
    ProviderNotFound(String),

    #[error("Cannot replace value at {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
