//! Error types for the Terraform driver.

use thiserror::Error;

/// Result type alias for Terraform operations.
pub type TerraformResult<T> = Result<T, TerraformError>;

/// Errors that can occur while driving Terraform.
#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("Terraform not available: {0}")]
    TerraformNotAvailable(String),

    #[error("terraform {command} failed with exit code {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i64,
        output: String,
    },

    #[error("Terraform execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Terraform timeout after {0} seconds")]
    Timeout(u64),

    #[error("Terraform output {0} not found")]
    OutputNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
