//! Provisioning downstream clusters from the generated main.tf.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tfp_config::{load_tfp_configs, replace_value, Module, TfpConfigs};
use tfp_framework::set_config_tf;
use tfp_rancher::ManagementApi;
use tfp_runner::{init_and_apply, Terraform, TerraformOptions};
use tracing::info;

use crate::error::SuiteResult;

/// Clusters generated for a config: one, named after the resource prefix.
pub fn cluster_names(configs: &TfpConfigs) -> Vec<String> {
    vec![configs.terraform.resource_prefix.clone()]
}

/// Generates, applies and looks up the clusters of one case.
pub struct Provisioner<'a, T: Terraform + ?Sized, A: ManagementApi + ?Sized> {
    terraform: &'a T,
    api: &'a A,
    options: &'a TerraformOptions,
}

impl<'a, T: Terraform + ?Sized, A: ManagementApi + ?Sized> Provisioner<'a, T, A> {
    pub fn new(terraform: &'a T, api: &'a A, options: &'a TerraformOptions) -> Self {
        Self {
            terraform,
            api,
            options,
        }
    }

    /// Write main.tf into the options directory, apply it and return the
    /// IDs Rancher assigned to the clusters. With `windows`, the Windows
    /// nodes of a custom module are added to the existing clusters.
    pub async fn provision(&self, configs: &TfpConfigs, windows: bool) -> SuiteResult<Vec<String>> {
        let names = cluster_names(configs);
        set_config_tf(configs, self.options.dir(), &names, windows)?;
        init_and_apply(self.terraform, self.options).await?;

        let ids = self.api.find_cluster_ids(&names).await?;
        info!("Provisioned clusters {:?}", ids);
        Ok(ids)
    }
}

/// Generate main.tf for the configured module without applying it, and
/// return its contents.
pub fn build_module(configs: &TfpConfigs, key_path: &Path) -> SuiteResult<String> {
    let path = set_config_tf(configs, key_path, &cluster_names(configs), false)?;
    let module = fs::read_to_string(&path)?;
    info!("{}", module);
    Ok(module)
}

/// Fill in `terratest.kubernetesVersion` with Rancher's default for the
/// module's distribution when the config leaves it empty. Returns the
/// version in effect.
pub async fn select_kubernetes_version<A: ManagementApi + ?Sized>(api: &A, doc: &mut Value) -> SuiteResult<String> {
    let configs = load_tfp_configs(doc)?;
    if !configs.terratest.kubernetes_version.is_empty() {
        return Ok(configs.terratest.kubernetes_version);
    }

    let module = Module::parse(&configs.terraform.module)?;
    let version = api.default_kubernetes_version(module.cluster_type).await?;
    replace_value(&["terratest", "kubernetesVersion"], &version, doc)?;
    info!("Using default {} version {}", module.cluster_type, version);
    Ok(version)
}
