//! Error types for HCL generation.

use thiserror::Error;

/// Result type alias for HCL operations.
pub type HclResult<T> = Result<T, HclError>;

/// Errors that can occur while building or writing HCL documents.
#[derive(Error, Debug)]
pub enum HclError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
