//! Terraform driver trait and result types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TerraformResult;
use crate::options::TerraformOptions;

/// Result of one terraform invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Subcommand, e.g. `apply`
    pub command: String,
    /// Exit code from the process
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl CommandResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Terraform driver.
#[async_trait]
pub trait Terraform: Send + Sync {
    /// Get the Terraform version string.
    async fn version(&self) -> TerraformResult<String>;

    /// Run `terraform init`.
    async fn init(&self, options: &TerraformOptions) -> TerraformResult<CommandResult>;

    /// Run `terraform apply -auto-approve`.
    async fn apply(&self, options: &TerraformOptions) -> TerraformResult<CommandResult>;

    /// Run `terraform destroy -auto-approve`.
    async fn destroy(&self, options: &TerraformOptions) -> TerraformResult<CommandResult>;

    /// Read a single output value as raw text.
    async fn output(&self, options: &TerraformOptions, name: &str) -> TerraformResult<String>;
}
