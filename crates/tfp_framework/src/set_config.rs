//! main.tf for the downstream clusters under test.

use std::fs;
use std::path::{Path, PathBuf};

use tfp_config::{ClusterType, Module, ProvisioningMode, TfpConfigs};
use tfp_hcl::HclFile;
use tracing::{debug, info};

use crate::custom::cluster::{set_custom, set_custom_windows};
use crate::custom::locals::{custom_cluster_names, set_locals};
use crate::error::{FrameworkError, FrameworkResult};
use crate::nodedriver::rke1::set_rke1;
use crate::nodedriver::rke2k3s::set_rke2_k3s;
use crate::providers::set_providers_tf;

pub const MAIN_TF: &str = "main.tf";

/// Build the document for `terraform.module`. With `windows`, the Linux
/// document is regenerated with the Windows nodes added.
pub fn build_main_tf(configs: &TfpConfigs, cluster_names: &[String], windows: bool) -> FrameworkResult<HclFile> {
    let module = Module::parse(&configs.terraform.module)?;
    debug!("Generating main.tf for module {}", module);

    if windows && !module.windows {
        return Err(FrameworkError::Unsupported(format!(
            "{} has no Windows nodes",
            module.name
        )));
    }

    let mut file = set_providers_tf(configs, &module)?;
    let root = file.body_mut();
    root.append_newline();

    match module.mode {
        ProvisioningMode::NodeDriver => {
            if cluster_names.is_empty() {
                return Err(FrameworkError::Unsupported(
                    "node driver modules need at least one cluster name".to_string(),
                ));
            }
            for name in cluster_names {
                match module.cluster_type {
                    ClusterType::Rke1 => set_rke1(root, configs, &module, name)?,
                    ClusterType::Rke2 | ClusterType::K3s => set_rke2_k3s(root, configs, &module, name)?,
                }
                root.append_newline();
            }
        }
        ProvisioningMode::Custom | ProvisioningMode::Airgap => {
            set_locals(root, &configs.terraform, &module, cluster_names);
            root.append_newline();

            for name in custom_cluster_names(&configs.terraform, cluster_names) {
                set_custom(root, configs, &module, &name)?;
                if windows {
                    set_custom_windows(root, configs, &name)?;
                }
            }
        }
    }

    file.validate()?;
    Ok(file)
}

/// Write `<key_path>/main.tf`, replacing the previous document.
pub fn set_config_tf(
    configs: &TfpConfigs,
    key_path: &Path,
    cluster_names: &[String],
    windows: bool,
) -> FrameworkResult<PathBuf> {
    let file = build_main_tf(configs, cluster_names, windows)?;

    fs::create_dir_all(key_path)?;
    let path = key_path.join(MAIN_TF);
    file.write_to(&path)?;

    info!(
        "Wrote {} for module {} ({} clusters)",
        path.display(),
        configs.terraform.module,
        cluster_names.len().max(1)
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::modules;

    #[test]
    fn test_windows_pass_requires_windows_module() {
        let mut configs = TfpConfigs::default();
        configs.terraform.module = modules::EC2_RKE2.to_string();
        let err = build_main_tf(&configs, &["c1".to_string()], true).unwrap_err();
        assert!(matches!(err, FrameworkError::Unsupported(_)));
    }

    #[test]
    fn test_unknown_module() {
        let mut configs = TfpConfigs::default();
        configs.terraform.module = "gke_rke2".to_string();
        let err = build_main_tf(&configs, &["c1".to_string()], false).unwrap_err();
        assert!(matches!(err, FrameworkError::Config(_)));
    }

    #[test]
    fn test_node_driver_needs_a_name() {
        let mut configs = TfpConfigs::default();
        configs.terraform.module = modules::LINODE_K3S.to_string();
        assert!(build_main_tf(&configs, &[], false).is_err());
    }
}
