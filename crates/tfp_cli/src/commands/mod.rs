//! CLI command definitions.
//!
//! Each subcommand runs one suite, or one maintenance task, against the
//! cattle config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_yaml::Value;
use tfp_config::{load_config_from_file, ConfigError, CONFIG_ENVIRONMENT_KEY};
use tfp_framework::repo_root;
use tfp_runner::{CliTerraform, CliTerraformOptions};
use tfp_suites::{RancherConnector, SuiteContext, SuiteReport};

pub mod build_module;
pub mod cleanup;
pub mod suites;

/// tfp - Rancher provisioning through generated Terraform
#[derive(Parser, Debug)]
#[command(name = "tfp")]
#[command(version, about = "Provision and verify Rancher clusters with generated Terraform")]
#[command(long_about = r#"
tfp generates main.tf for Rancher downstream clusters and standalone Rancher
servers, applies it with the terraform CLI and verifies the result through
the Rancher management API.

COMMANDS:
  build-module  → Generate main.tf for the configured module and print it
  sanity        → Standalone Rancher, then one cluster per distribution
  proxy         → Rancher behind a squid proxy
  upgrade       → Clusters before and after a Rancher upgrade
  cleanup       → Destroy a scenario and remove its local state

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or config
  3 - Verification failure
  5 - Terraform failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path of the cattle config
    #[arg(short, long, global = true, env = CONFIG_ENVIRONMENT_KEY)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log terraform commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate main.tf for the configured module and print it
    #[command(name = "build-module")]
    BuildModule,

    /// Run the sanity suite
    Sanity,

    /// Run the proxy suite
    Proxy(suites::ProxyArgs),

    /// Run the upgrade suite
    Upgrade,

    /// Destroy a scenario and remove its local state
    Cleanup(cleanup::CleanupArgs),
}

impl Cli {
    /// Load the cattle config named by `--config` or `CATTLE_TEST_CONFIG`.
    pub fn load_config(&self) -> Result<Value> {
        let path = self
            .config
            .as_deref()
            .ok_or(ConfigError::MissingEnv(CONFIG_ENVIRONMENT_KEY))?;
        load(path)
    }

    /// Everything a suite needs, with a real terraform driver and Rancher
    /// client.
    pub fn suite_context(&self) -> Result<SuiteContext> {
        let doc = self.load_config()?;

        let mut options = CliTerraformOptions::new();
        if self.dry_run {
            options = options.dry_run();
        }
        let terraform = CliTerraform::new(options)?;

        Ok(SuiteContext::new(
            Arc::new(terraform),
            Arc::new(RancherConnector),
            doc,
            repo_root(),
        ))
    }
}

fn load(path: &Path) -> Result<Value> {
    let doc = load_config_from_file(path).with_context(|| format!("loading {}", path.display()))?;
    Ok(doc)
}

/// Print a suite report and fail when any case failed.
pub fn finish_report(report: SuiteReport) -> Result<()> {
    println!("{}", report);
    report.into_result()?;
    Ok(())
}
