//! Proxy: Rancher behind a squid proxy, with clusters provisioned both
//! through the proxy and around it.

use tfp_config::TfpConfigs;
use tfp_runner::TerraformOptions;

use crate::cases::{no_proxy_cases, proxy_cases};
use crate::context::SuiteContext;
use crate::error::SuiteResult;
use crate::report::SuiteReport;
use crate::runner::{finish, run_cases, teardown, ProxySetting};
use crate::standalone::Standalone;

pub struct ProxySuite {
    ctx: SuiteContext,
}

impl ProxySuite {
    pub const NAME: &'static str = "proxy";

    pub fn new(ctx: SuiteContext) -> Self {
        Self { ctx }
    }

    /// Clusters whose nodes bypass the proxy.
    pub async fn run_no_proxy(&self) -> SuiteResult<SuiteReport> {
        self.run(false).await
    }

    /// Clusters whose agents go through the bastion's proxy.
    pub async fn run_proxy(&self) -> SuiteResult<SuiteReport> {
        self.run(true).await
    }

    async fn run(&self, proxied: bool) -> SuiteResult<SuiteReport> {
        let configs = self.ctx.configs()?;
        let options = Standalone::Proxy.options(&self.ctx, &configs);
        let name = if proxied {
            Self::NAME.to_string()
        } else {
            format!("no-{}", Self::NAME)
        };
        let mut report = SuiteReport::new(name);

        let body = self.run_body(&configs, &options, proxied, &mut report).await;
        let teardown = teardown(&self.ctx, &options).await;
        finish(report, body, teardown)
    }

    async fn run_body(
        &self,
        configs: &TfpConfigs,
        options: &TerraformOptions,
        proxied: bool,
        report: &mut SuiteReport,
    ) -> SuiteResult<()> {
        let nodes = Standalone::Proxy.create(&self.ctx, configs, options).await?;

        if proxied {
            let proxy = Standalone::Proxy.proxy_setting(&nodes)?;
            run_cases(&self.ctx, &proxy_cases(), &proxy, report).await;
        } else {
            run_cases(&self.ctx, &no_proxy_cases(), &ProxySetting::Disabled, report).await;
        }
        Ok(())
    }
}
