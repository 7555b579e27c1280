//! Upgrade: provision against the initial Rancher release, upgrade Rancher
//! in place, then provision again.

use tfp_config::{StandaloneConfig, TfpConfigs};
use tfp_framework::{create_upgrade_main_tf, setup, Scenario};
use tfp_runner::TerraformOptions;
use tracing::info;

use crate::cases::{airgap_cases, provisioning_cases, TestCase};
use crate::context::SuiteContext;
use crate::error::{SuiteError, SuiteResult};
use crate::report::SuiteReport;
use crate::runner::{finish, run_cases, teardown};
use crate::standalone::Standalone;

pub struct UpgradeSuite {
    ctx: SuiteContext,
}

impl UpgradeSuite {
    pub const NAME: &'static str = "upgrade";

    pub fn new(ctx: SuiteContext) -> Self {
        Self { ctx }
    }

    /// The environment to upgrade, picked from the upgrade flags in the same
    /// order the upgrade itself uses: airgap, then proxy, then plain.
    pub fn standalone(standalone: &StandaloneConfig) -> SuiteResult<Standalone> {
        if standalone.upgrade_airgap_rancher {
            Ok(Standalone::Airgap)
        } else if standalone.upgrade_proxy_rancher {
            Ok(Standalone::Proxy)
        } else if standalone.upgrade_rancher {
            Ok(Standalone::Sanity)
        } else {
            Err(SuiteError::Setup(
                "no upgrade selected, set one of upgradeRancher, upgradeProxyRancher or upgradeAirgapRancher"
                    .to_string(),
            ))
        }
    }

    pub async fn run(&self) -> SuiteResult<SuiteReport> {
        let configs = self.ctx.configs()?;
        let standalone = Self::standalone(&configs.terraform.standalone)?;
        let options = standalone.options(&self.ctx, &configs);
        let upgrade_options = setup(&configs, &self.ctx.key_path(Scenario::Upgrade));
        let mut report = SuiteReport::new(Self::NAME);

        let body = self
            .run_body(standalone, &configs, &options, &upgrade_options, &mut report)
            .await;

        // The upgrade state only holds provisioners; the hosts belong to the
        // environment's own state.
        let upgrade_teardown = teardown(&self.ctx, &upgrade_options).await;
        let teardown = teardown(&self.ctx, &options).await.and(upgrade_teardown);
        finish(report, body, teardown)
    }

    async fn run_body(
        &self,
        standalone: Standalone,
        configs: &TfpConfigs,
        options: &TerraformOptions,
        upgrade_options: &TerraformOptions,
        report: &mut SuiteReport,
    ) -> SuiteResult<()> {
        let nodes = standalone.create(&self.ctx, configs, options).await?;
        let proxy = standalone.proxy_setting(&nodes)?;

        run_cases(&self.ctx, &cases(standalone, "Pre-Upgrade"), &proxy, report).await;

        let upgraded = create_upgrade_main_tf(
            self.ctx.terraform.as_ref(),
            upgrade_options,
            &configs.terraform,
            &self.ctx.scripts(),
            &nodes,
        )
        .await?;
        if !upgraded {
            return Err(SuiteError::Setup("Rancher was not upgraded".to_string()));
        }
        info!("Rancher upgraded, provisioning again");

        run_cases(&self.ctx, &cases(standalone, "Post-Upgrade"), &proxy, report).await;
        Ok(())
    }
}

fn cases(standalone: Standalone, prefix: &str) -> Vec<TestCase> {
    match standalone {
        Standalone::Airgap => airgap_cases(prefix),
        Standalone::Sanity | Standalone::Proxy => provisioning_cases(prefix),
    }
}
