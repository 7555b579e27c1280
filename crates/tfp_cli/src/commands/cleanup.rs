//! Cleanup command - Destroy a scenario and remove its local state.

use anyhow::Result;
use clap::Args;
use tfp_config::{load_tfp_configs, TfpConfigs};
use tfp_framework::{key_path, setup, Scenario};
use tfp_runner::{cleanup, CliTerraform, CliTerraformOptions};
use tracing::{info, warn};

use super::Cli;

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Scenario directory to clean: rancher, sanity, proxy, airgap or upgrade
    pub scenario: Scenario,
}

pub async fn execute(cli: &Cli, args: &CleanupArgs) -> Result<()> {
    // The config only contributes the provider region here
    let configs = match cli.load_config() {
        Ok(doc) => load_tfp_configs(&doc)?,
        Err(e) => {
            warn!("No config loaded ({:#}), cleaning up with defaults", e);
            TfpConfigs::default()
        }
    };

    let mut options = CliTerraformOptions::new();
    if cli.dry_run {
        options = options.dry_run();
    }
    let terraform = CliTerraform::new(options)?;

    let options = setup(&configs, &key_path(args.scenario));
    cleanup(&terraform, &options).await?;
    info!("Cleaned up {}", args.scenario);
    Ok(())
}
