//! Build-module command - Generate main.tf without applying it.

use anyhow::Result;
use tfp_config::load_tfp_configs;
use tfp_framework::{key_path, Scenario};
use tracing::info;

use super::Cli;

pub async fn execute(cli: &Cli) -> Result<()> {
    let configs = load_tfp_configs(&cli.load_config()?)?;
    let key_path = key_path(Scenario::Rancher);

    info!("Building module {} in {}", configs.terraform.module, key_path.display());
    tfp_suites::build_module(&configs, &key_path)?;
    Ok(())
}
