//! The Rancher server a suite provisions against.

use tfp_config::TfpConfigs;
use tfp_framework::{
    create_airgap_main_tf, create_proxy_main_tf, create_sanity_main_tf, setup, Scenario, StandaloneNodes,
};
use tfp_runner::TerraformOptions;
use tracing::info;

use crate::context::SuiteContext;
use crate::error::{SuiteError, SuiteResult};
use crate::runner::ProxySetting;

/// Flavors of standalone Rancher environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standalone {
    Sanity,
    Proxy,
    Airgap,
}

impl Standalone {
    /// Directory holding the environment's Terraform state.
    pub fn scenario(&self) -> Scenario {
        match self {
            Standalone::Sanity => Scenario::Sanity,
            Standalone::Proxy => Scenario::Proxy,
            Standalone::Airgap => Scenario::Airgap,
        }
    }

    pub fn options(&self, ctx: &SuiteContext, configs: &TfpConfigs) -> TerraformOptions {
        setup(configs, &ctx.key_path(self.scenario()))
    }

    /// Build the environment and return its hosts.
    pub async fn create(
        &self,
        ctx: &SuiteContext,
        configs: &TfpConfigs,
        options: &TerraformOptions,
    ) -> SuiteResult<StandaloneNodes> {
        info!("Creating {:?} Rancher environment in {:?}", self, options.dir());
        let terraform = ctx.terraform.as_ref();
        let scripts = ctx.scripts();

        let nodes = match self {
            Standalone::Sanity => create_sanity_main_tf(terraform, options, &configs.terraform, &scripts).await?,
            Standalone::Proxy => create_proxy_main_tf(terraform, options, &configs.terraform, &scripts).await?,
            Standalone::Airgap => create_airgap_main_tf(terraform, options, &configs.terraform, &scripts).await?,
        };
        Ok(nodes)
    }

    /// Proxy setting for cases run against this environment. Proxied and
    /// airgapped clusters reach the outside through the bastion.
    pub fn proxy_setting(&self, nodes: &StandaloneNodes) -> SuiteResult<ProxySetting> {
        match self {
            Standalone::Sanity => Ok(ProxySetting::Unchanged),
            Standalone::Proxy | Standalone::Airgap => nodes
                .bastion
                .as_ref()
                .map(|b| ProxySetting::Bastion(b.public_dns.clone()))
                .ok_or_else(|| SuiteError::Setup("environment has no bastion".to_string())),
        }
    }
}
