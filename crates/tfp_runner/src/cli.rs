//! CLI-based Terraform driver.
//!
//! Shells out to the `terraform` binary with `-chdir`, streaming each output
//! line through `tracing` while also capturing it.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{TerraformError, TerraformResult};
use crate::options::TerraformOptions;
use crate::runner::{CommandResult, Terraform};

/// Log output from a terraform process.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Log handler callback type.
pub type LogHandler = Arc<dyn Fn(LogLine) + Send + Sync>;

/// CLI driver options.
#[derive(Debug, Clone)]
pub struct CliTerraformOptions {
    /// Path or name of the terraform binary
    pub binary: PathBuf,
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
    /// Delay between retries of transient failures
    pub retry_delay: Duration,
}

impl Default for CliTerraformOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            dry_run: false,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl CliTerraformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Terraform driver backed by the terraform CLI.
pub struct CliTerraform {
    options: CliTerraformOptions,
    log_handler: Option<LogHandler>,
}

/// Everything a blocking execution needs, owned so it can move to a worker thread.
struct Invocation {
    binary: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout_seconds: u64,
    stream_logs: bool,
    log_handler: Option<LogHandler>,
}

impl CliTerraform {
    /// Create a driver, checking that the binary runs unless in dry-run mode.
    pub fn new(options: CliTerraformOptions) -> TerraformResult<Self> {
        if !options.dry_run && !Self::is_binary_available(&options.binary) {
            return Err(TerraformError::TerraformNotAvailable(format!(
                "{} could not be executed",
                options.binary.display()
            )));
        }

        Ok(Self::with_options(options))
    }

    /// Create a driver without checking the binary.
    pub fn with_options(options: CliTerraformOptions) -> Self {
        Self {
            options,
            log_handler: None,
        }
    }

    /// Set a log handler for streaming logs.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn is_binary_available(binary: &PathBuf) -> bool {
        Command::new(binary)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Build the argument list for a subcommand.
    pub(crate) fn build_args(
        &self,
        command: &str,
        options: &TerraformOptions,
        extra: &[&str],
    ) -> Vec<String> {
        let mut args = vec![
            format!("-chdir={}", options.terraform_dir.to_string_lossy()),
            command.to_string(),
        ];

        match command {
            "init" => {
                args.push("-input=false".to_string());
                args.push("-upgrade=false".to_string());
            }
            "apply" | "destroy" => {
                args.push("-auto-approve".to_string());
                args.push("-input=false".to_string());
                for (key, value) in &options.vars {
                    args.push("-var".to_string());
                    args.push(format!("{}={}", key, value));
                }
            }
            _ => {}
        }

        if options.no_color {
            args.push("-no-color".to_string());
        }

        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    /// Format command for logging, hiding `-var` values.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.options.binary.to_string_lossy().to_string();
        let mut hide_next = false;
        for arg in args {
            if hide_next {
                let name = arg.split('=').next().unwrap_or_default();
                cmd.push_str(&format!(" '{}=***'", name));
                hide_next = false;
                continue;
            }
            hide_next = arg == "-var";
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }

    /// Run a subcommand, retrying transient failures.
    async fn run(
        &self,
        command: &str,
        options: &TerraformOptions,
        extra: &[&str],
    ) -> TerraformResult<CommandResult> {
        let args = self.build_args(command, options, extra);
        let cmd_str = self.format_command(&args);

        info!("Running terraform {} in {:?}", command, options.terraform_dir);
        debug!("Command: {}", cmd_str);

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            let now = Utc::now();
            return Ok(CommandResult {
                command: command.to_string(),
                exit_code: 0,
                stdout: format!("[DRY-RUN] Command: {}", cmd_str),
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
            });
        }

        let mut attempt = 0;
        loop {
            let invocation = Invocation {
                binary: self.options.binary.clone(),
                args: args.clone(),
                env: options.env.clone(),
                timeout_seconds: options.timeout_seconds,
                stream_logs: options.stream_logs,
                log_handler: self.log_handler.clone(),
            };

            let started_at = Utc::now();
            let (exit_code, stdout, stderr) =
                tokio::task::spawn_blocking(move || execute_with_streaming(invocation))
                    .await
                    .map_err(|e| TerraformError::ExecutionFailed(e.to_string()))??;
            let finished_at = Utc::now();
            let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

            let result = CommandResult {
                command: command.to_string(),
                exit_code,
                stdout,
                stderr,
                started_at,
                finished_at,
                duration_ms,
            };

            if result.success() {
                info!("terraform {} completed in {}ms", command, duration_ms);
                return Ok(result);
            }

            let output = result.combined_output();
            if attempt < options.max_retries && options.is_retryable(&output) {
                attempt += 1;
                warn!(
                    "terraform {} hit a transient error, retrying ({}/{})",
                    command, attempt, options.max_retries
                );
                tokio::time::sleep(self.options.retry_delay).await;
                continue;
            }

            error!(
                "terraform {} failed with exit code {} after {}ms",
                command, exit_code, duration_ms
            );
            return Err(TerraformError::CommandFailed {
                command: command.to_string(),
                exit_code,
                output: last_lines(&output, 20),
            });
        }
    }
}

fn last_lines(output: &str, count: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

fn spawn_reader<R: Read + Send + 'static>(
    source: R,
    stream: LogStream,
    stream_logs: bool,
    log_handler: Option<LogHandler>,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let reader = BufReader::new(source);
        let mut output = String::new();
        for line in reader.lines().map_while(Result::ok) {
            output.push_str(&line);
            output.push('\n');
            if stream_logs {
                match stream {
                    LogStream::Stdout => info!(target: "terraform", "{}", line),
                    LogStream::Stderr => warn!(target: "terraform", "{}", line),
                }
            }
            if let Some(handler) = &log_handler {
                handler(LogLine {
                    timestamp: Utc::now(),
                    stream,
                    message: line,
                });
            }
        }
        output
    })
}

/// Execute a command and capture output with streaming.
fn execute_with_streaming(invocation: Invocation) -> TerraformResult<(i64, String, String)> {
    let mut cmd = Command::new(&invocation.binary);
    cmd.args(&invocation.args);
    cmd.envs(&invocation.env);
    cmd.env("TF_IN_AUTOMATION", "1");
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        TerraformError::ExecutionFailed(format!(
            "Failed to spawn {}: {}",
            invocation.binary.display(),
            e
        ))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| TerraformError::ExecutionFailed("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| TerraformError::ExecutionFailed("stderr was not captured".to_string()))?;

    let stdout_handle = spawn_reader(
        stdout,
        LogStream::Stdout,
        invocation.stream_logs,
        invocation.log_handler.clone(),
    );
    let stderr_handle = spawn_reader(
        stderr,
        LogStream::Stderr,
        invocation.stream_logs,
        invocation.log_handler.clone(),
    );

    // Wait for completion with timeout
    let status = if invocation.timeout_seconds > 0 {
        let timeout = Duration::from_secs(invocation.timeout_seconds);
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        return Err(TerraformError::Timeout(invocation.timeout_seconds));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(TerraformError::ExecutionFailed(format!(
                        "Failed to wait for process: {}",
                        e
                    )));
                }
            }
        }
    } else {
        child.wait().map_err(|e| {
            TerraformError::ExecutionFailed(format!("Failed to wait for process: {}", e))
        })?
    };

    let stdout_output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();

    let exit_code = status.code().unwrap_or(-1) as i64;

    Ok((exit_code, stdout_output, stderr_output))
}

#[async_trait]
impl Terraform for CliTerraform {
    async fn version(&self) -> TerraformResult<String> {
        if self.options.dry_run {
            return Ok("terraform (dry-run)".to_string());
        }

        let output = Command::new(&self.options.binary)
            .arg("version")
            .output()
            .map_err(|e| TerraformError::TerraformNotAvailable(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn init(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.run("init", options, &[]).await
    }

    async fn apply(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.run("apply", options, &[]).await
    }

    async fn destroy(&self, options: &TerraformOptions) -> TerraformResult<CommandResult> {
        self.run("destroy", options, &[]).await
    }

    async fn output(&self, options: &TerraformOptions, name: &str) -> TerraformResult<String> {
        if self.options.dry_run {
            return Ok(format!("dry-run-{}", name));
        }

        let quiet = options.clone().stream_logs(false).max_retries(0);
        match self.run("output", &quiet, &["-raw", name]).await {
            Ok(result) => Ok(result.stdout.trim().to_string()),
            Err(TerraformError::CommandFailed { output, .. }) if output.contains("not found") => {
                Err(TerraformError::OutputNotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
