//! Suite commands - sanity, proxy and upgrade.

use anyhow::Result;
use clap::Args;
use tfp_suites::{ProxySuite, SanitySuite, UpgradeSuite};

use super::{finish_report, Cli};

#[derive(Args, Debug)]
pub struct ProxyArgs {
    /// Provision clusters that bypass the proxy
    #[arg(long)]
    pub no_proxy: bool,
}

pub async fn sanity(cli: &Cli) -> Result<()> {
    let report = SanitySuite::new(cli.suite_context()?).run().await?;
    finish_report(report)
}

pub async fn proxy(cli: &Cli, args: &ProxyArgs) -> Result<()> {
    let suite = ProxySuite::new(cli.suite_context()?);
    let report = if args.no_proxy {
        suite.run_no_proxy().await?
    } else {
        suite.run_proxy().await?
    };
    finish_report(report)
}

pub async fn upgrade(cli: &Cli) -> Result<()> {
    let report = UpgradeSuite::new(cli.suite_context()?).run().await?;
    finish_report(report)
}
