//! Error types for the provisioning suites.

use thiserror::Error;

/// Result type alias for suite operations.
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Errors that stop a case or a whole suite.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Config error: {0}")]
    Config(#[from] tfp_config::ConfigError),

    #[error("Generation error: {0}")]
    Framework(#[from] tfp_framework::FrameworkError),

    #[error("Terraform error: {0}")]
    Terraform(#[from] tfp_runner::TerraformError),

    #[error("Rancher error: {0}")]
    Rancher(#[from] tfp_rancher::RancherError),

    #[error("Suite setup failed: {0}")]
    Setup(String),

    #[error("{failed} of {total} cases failed")]
    CasesFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
