//! Per-directory Terraform invocation options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Options for running Terraform against one module directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformOptions {
    /// Directory holding `main.tf`
    pub terraform_dir: PathBuf,
    /// Pass `-no-color`
    pub no_color: bool,
    /// `-var` arguments, sorted by name
    pub vars: BTreeMap<String, String>,
    /// Extra environment for the terraform process
    pub env: BTreeMap<String, String>,
    /// Timeout per command in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Stream output lines while the command runs
    pub stream_logs: bool,
    /// Output substrings that mark a failure as transient
    pub retryable_errors: Vec<String>,
    /// Attempts after the first failure for retryable errors
    pub max_retries: u32,
}

impl TerraformOptions {
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            no_color: true,
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            timeout_seconds: 3600,
            stream_logs: true,
            retryable_errors: vec![
                "RequestError: send request failed".to_string(),
                "connection reset by peer".to_string(),
                "TLS handshake timeout".to_string(),
                "Error acquiring the state lock".to_string(),
            ],
            max_retries: 3,
        }
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn main_tf(&self) -> PathBuf {
        self.terraform_dir.join("main.tf")
    }

    pub fn dir(&self) -> &Path {
        &self.terraform_dir
    }

    /// Whether a failed command's output matches a transient error.
    pub fn is_retryable(&self, output: &str) -> bool {
        self.retryable_errors.iter().any(|e| output.contains(e.as_str()))
    }
}
