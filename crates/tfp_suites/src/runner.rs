//! The per-case loop shared by every suite.

use std::sync::Arc;

use chrono::Utc;
use serde_yaml::Value;
use tfp_config::{load_tfp_configs, replace_value, uniquify_terraform, Module, TfpConfigs};
use tfp_framework::{setup, Scenario};
use tfp_rancher::{verify_clusters_state_every, ManagementApi};
use tfp_runner::{cleanup, TerraformOptions};
use tracing::{error, info, warn};

use crate::cases::{case_name, TestCase};
use crate::context::SuiteContext;
use crate::error::{SuiteError, SuiteResult};
use crate::provision::{select_kubernetes_version, Provisioner};
use crate::report::{CaseResult, SuiteReport};

/// What to do with `terraform.proxy.proxyBastion` for a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySetting {
    /// Keep whatever the config says.
    Unchanged,
    /// Clear it so nodes talk to Rancher directly.
    Disabled,
    Bastion(String),
}

struct PreparedCase {
    name: String,
    configs: TfpConfigs,
    api: Arc<dyn ManagementApi>,
}

/// Run `cases` in order, recording each outcome. A failed case does not
/// stop the ones after it.
pub async fn run_cases(ctx: &SuiteContext, cases: &[TestCase], proxy: &ProxySetting, report: &mut SuiteReport) {
    for case in cases {
        let result = run_case(ctx, case, proxy).await;
        match &result.message {
            Some(message) => error!("{} failed: {}", result.name, message),
            None => info!("{} passed", result.name),
        }
        report.record(result);
    }
}

async fn run_case(ctx: &SuiteContext, case: &TestCase, proxy: &ProxySetting) -> CaseResult {
    let started_at = Utc::now();

    let prepared = match prepare_case(ctx, case, proxy).await {
        Ok(prepared) => prepared,
        Err(e) => return CaseResult::failed(&case.name, started_at, e.to_string()),
    };
    info!("Running {}", prepared.name);

    let options = setup(&prepared.configs, &ctx.key_path(Scenario::Rancher));
    let provisioned = provision_and_verify(ctx, &prepared, &options).await;

    // Cleanup runs whatever happened above
    let cleaned = cleanup(ctx.terraform.as_ref(), &options).await;

    match (provisioned, cleaned) {
        (Err(e), cleaned) => {
            if let Err(cleanup_err) = cleaned {
                warn!("Cleanup after failed case also failed: {}", cleanup_err);
            }
            CaseResult::failed(prepared.name, started_at, e.to_string())
        }
        (Ok(()), Err(e)) => CaseResult::failed(prepared.name, started_at, format!("cleanup failed: {}", e)),
        (Ok(()), Ok(())) => CaseResult::passed(prepared.name, started_at),
    }
}

/// Give the case its own copy of the config: unique resource names, a fresh
/// login, the case's module and pools, and a concrete Kubernetes version.
async fn prepare_case(ctx: &SuiteContext, case: &TestCase, proxy: &ProxySetting) -> SuiteResult<PreparedCase> {
    let mut docs = [ctx.cattle_config.clone()];
    uniquify_terraform(&mut docs)?;
    let [mut doc] = docs;

    let api = connect(ctx, &doc).await?;

    replace_value(&["terratest", "nodepools"], &case.nodepools, &mut doc)?;
    replace_value(&["terraform", "module"], case.module, &mut doc)?;
    match proxy {
        ProxySetting::Unchanged => {}
        ProxySetting::Disabled => replace_value(&["terraform", "proxy", "proxyBastion"], "", &mut doc)?,
        ProxySetting::Bastion(bastion) => replace_value(&["terraform", "proxy", "proxyBastion"], bastion, &mut doc)?,
    }

    let version = select_kubernetes_version(api.as_ref(), &mut doc).await?;
    Ok(PreparedCase {
        name: case_name(case, &version),
        configs: load_tfp_configs(&doc)?,
        api,
    })
}

/// Log in and apply the post-install settings.
async fn connect(ctx: &SuiteContext, doc: &Value) -> SuiteResult<Arc<dyn ManagementApi>> {
    let rancher = load_tfp_configs(doc)?.rancher;
    let api = ctx.connector.connect(&rancher).await?;
    api.post_rancher_install(&rancher.admin_password).await?;
    Ok(api)
}

async fn provision_and_verify(ctx: &SuiteContext, prepared: &PreparedCase, options: &TerraformOptions) -> SuiteResult<()> {
    let module = Module::parse(&prepared.configs.terraform.module)?;
    let provisioner = Provisioner::new(ctx.terraform.as_ref(), prepared.api.as_ref(), options);

    let ids = provisioner.provision(&prepared.configs, false).await?;
    verify(ctx, prepared.api.as_ref(), &ids).await?;

    if module.windows {
        info!("Adding Windows nodes to {:?}", ids);
        let ids = provisioner.provision(&prepared.configs, true).await?;
        verify(ctx, prepared.api.as_ref(), &ids).await?;
    }

    Ok(())
}

async fn verify(ctx: &SuiteContext, api: &dyn ManagementApi, ids: &[String]) -> SuiteResult<()> {
    verify_clusters_state_every(api, ids, ctx.verify_timeout, ctx.poll_interval).await?;
    Ok(())
}

/// Tear down a standalone environment, logging instead of failing when
/// cleanup is disabled in the config.
pub(crate) async fn teardown(ctx: &SuiteContext, options: &TerraformOptions) -> SuiteResult<()> {
    if !ctx.configs()?.rancher.should_cleanup() {
        warn!("Cleanup disabled, leaving {:?} in place", options.dir());
        return Ok(());
    }
    cleanup(ctx.terraform.as_ref(), options).await?;
    Ok(())
}

/// Combine a suite body result with its teardown result; the body error
/// wins when both fail. Failed cases stay in the report.
pub(crate) fn finish(
    mut report: SuiteReport,
    body: SuiteResult<()>,
    teardown: SuiteResult<()>,
) -> SuiteResult<SuiteReport> {
    report.finish();
    if let (Err(_), Err(e)) = (&body, &teardown) {
        warn!("Teardown also failed: {}", e);
    }
    body?;
    teardown.map_err(|e| SuiteError::Setup(format!("teardown failed: {}", e)))?;
    Ok(report)
}
