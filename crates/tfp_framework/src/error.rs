//! Error types for main.tf generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;

/// Errors that can occur while generating or applying main.tf.
#[derive(Error, Debug)]
pub enum FrameworkError {
    #[error("Config error: {0}")]
    Config(#[from] tfp_config::ConfigError),

    #[error("HCL error: {0}")]
    Hcl(#[from] tfp_hcl::HclError),

    #[error("Terraform error: {0}")]
    Terraform(#[from] tfp_runner::TerraformError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
