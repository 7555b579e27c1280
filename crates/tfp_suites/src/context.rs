//! Everything a suite needs to run: drivers, config and locations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_yaml::Value;
use tfp_config::{load_tfp_configs, TfpConfigs};
use tfp_framework::{key_path_in, Scenario, ScriptLibrary};
use tfp_rancher::{DEFAULT_POLL_INTERVAL, DEFAULT_VERIFY_TIMEOUT};
use tfp_runner::Terraform;

use crate::connect::Connect;
use crate::error::SuiteResult;

/// Shared state of a suite run.
#[derive(Clone)]
pub struct SuiteContext {
    pub terraform: Arc<dyn Terraform>,
    pub connector: Arc<dyn Connect>,
    /// The cattle config as loaded; each case edits its own copy.
    pub cattle_config: Value,
    pub repo_root: PathBuf,
    pub verify_timeout: Duration,
    pub poll_interval: Duration,
}

impl SuiteContext {
    pub fn new(
        terraform: Arc<dyn Terraform>,
        connector: Arc<dyn Connect>,
        cattle_config: Value,
        repo_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            terraform,
            connector,
            cattle_config,
            repo_root: repo_root.into(),
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override how long clusters may take to go active.
    pub fn verify_every(mut self, timeout: Duration, interval: Duration) -> Self {
        self.verify_timeout = timeout;
        self.poll_interval = interval;
        self
    }

    pub fn configs(&self) -> SuiteResult<TfpConfigs> {
        Ok(load_tfp_configs(&self.cattle_config)?)
    }

    pub fn key_path(&self, scenario: Scenario) -> PathBuf {
        key_path_in(&self.repo_root, scenario)
    }

    pub fn scripts(&self) -> ScriptLibrary {
        ScriptLibrary::from_repo_root(&self.repo_root)
    }
}
