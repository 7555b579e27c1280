//! Error types for the management API client.

use thiserror::Error;

/// Result type alias for Rancher API operations.
pub type RancherResult<T> = Result<T, RancherError>;

/// Errors returned by the management API or while waiting on it.
#[derive(Error, Debug)]
pub enum RancherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rancher API error {status} on {path}: {message}")]
    Api {
        status: u16,
        path: String,
        message: String,
    },

    #[error("Login failed for user {0}")]
    LoginFailed(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Cluster {id} is not ready, last state: {state}")]
    ClusterNotReady { id: String, state: String },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Setting not found: {0}")]
    SettingNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
