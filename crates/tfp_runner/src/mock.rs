//! Mock Terraform driver for testing.
//!
//! Captures every call and replays queued responses so suites can be
//! exercised without a terraform binary or cloud account.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{TerraformError, TerraformResult};
use crate::options::TerraformOptions;
use crate::runner::{CommandResult, Terraform};

/// Predefined mock response for a terraform command.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub terraform_dir: PathBuf,
    /// Content of `main.tf` at the time of the call, if present
    pub main_tf: Option<String>,
    pub output_name: Option<String>,
}

/// Mock terraform driver.
///
/// Responses are consumed in order across init/apply/destroy; once the queue
/// is exhausted every command succeeds.
#[derive(Clone)]
pub struct MockTerraform {
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    outputs: Arc<RwLock<HashMap<String, String>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockTerraform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTerraform {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            outputs: Arc::new(RwLock::new(HashMap::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next command.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set the value returned by `output(name)`.
    pub fn with_output(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.write().insert(name.into(), value.into());
        self
    }

    /// Set a failure to simulate on every command.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Methods called, in order.
    pub fn get_methods(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .map(|c| c.method.clone())
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    fn record_call(&self, method: &str, options: &TerraformOptions, output_name: Option<&str>) {
        let main_tf = std::fs::read_to_string(options.main_tf()).ok();
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            terraform_dir: options.terraform_dir.clone(),
            main_tf,
            output_name: output_name.map(String::from),
        });
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }

    fn execute(&self, method: &str, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.record_call(method, options, None);

        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(TerraformError::ExecutionFailed(message));
        }

        let response = self.next_response();
        let now = Utc::now();
        let result = CommandResult {
            command: method.to_string(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        };

        if result.success() {
            Ok(result)
        } else {
            Err(TerraformError::CommandFailed {
                command: method.to_string(),
                exit_code: result.exit_code,
                output: result.combined_output(),
            })
        }
    }
}

#[async_trait]
impl Terraform for MockTerraform {
    async fn version(&self) -> TerraformResult<String> {
        Ok("Terraform v1.6.0 (mock)".to_string())
    }

    async fn init(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.execute("init", options)
    }

    async fn apply(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.execute("apply", options)
    }

    async fn destroy(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.execute("destroy", options)
    }

    async fn output(&self, options: &TerraformOptions, name: &str) -> TerraformResult<String> {
        self.record_call("output", options, Some(name));
        self.outputs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TerraformError::OutputNotFound(name.to_string()))
    }
}
