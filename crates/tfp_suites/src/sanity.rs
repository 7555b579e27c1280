//! Sanity: a standalone Rancher, then one cluster per distribution.

use tfp_config::TfpConfigs;
use tfp_runner::TerraformOptions;
use tracing::info;

use crate::cases::sanity_cases;
use crate::context::SuiteContext;
use crate::error::SuiteResult;
use crate::report::SuiteReport;
use crate::runner::{finish, run_cases, teardown, ProxySetting};
use crate::standalone::Standalone;

pub struct SanitySuite {
    ctx: SuiteContext,
}

impl SanitySuite {
    pub const NAME: &'static str = "sanity";

    pub fn new(ctx: SuiteContext) -> Self {
        Self { ctx }
    }

    /// Set up Rancher, run every case and tear Rancher down again, even when
    /// setup or a case failed.
    pub async fn run(&self) -> SuiteResult<SuiteReport> {
        let configs = self.ctx.configs()?;
        let options = Standalone::Sanity.options(&self.ctx, &configs);
        let mut report = SuiteReport::new(Self::NAME);

        let body = self.run_body(&configs, &options, &mut report).await;
        let teardown = teardown(&self.ctx, &options).await;
        finish(report, body, teardown)
    }

    async fn run_body(
        &self,
        configs: &TfpConfigs,
        options: &TerraformOptions,
        report: &mut SuiteReport,
    ) -> SuiteResult<()> {
        Standalone::Sanity.create(&self.ctx, configs, options).await?;
        info!("Rancher is up, running {} cases", Self::NAME);

        run_cases(&self.ctx, &sanity_cases(), &ProxySetting::Unchanged, report).await;
        Ok(())
    }
}
