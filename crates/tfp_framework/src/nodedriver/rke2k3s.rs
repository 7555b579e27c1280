//! RKE2 and K3S clusters provisioned through `rancher2_cluster_v2`.

use tfp_config::{validate_nodepool, Module, NodeProvider, TerraformConfig, TfpConfigs};
use tfp_hcl::{list_of_strings, traversal, Body};
use tracing::debug;

use super::set_proxy_config;
use crate::defaults::{CLOUD_CREDENTIAL, CLUSTER_V2, MACHINE_CONFIG_V2, RESOURCE};
use crate::error::FrameworkResult;

/// Append the cloud credential, machine config and cluster for one
/// node-driver RKE2/K3S cluster.
pub fn set_rke2_k3s(
    root: &mut Body,
    configs: &TfpConfigs,
    module: &Module,
    cluster_name: &str,
) -> FrameworkResult<()> {
    let terraform = &configs.terraform;
    let terratest = &configs.terratest;

    for (num, pool) in terratest.nodepools.iter().enumerate() {
        validate_nodepool(pool, num)?;
    }

    set_cloud_credential(root, terraform, module.provider, cluster_name)?;
    root.append_newline();

    set_machine_config(root, terraform, module.provider, cluster_name);
    root.append_newline();

    let cluster = root.append_block(RESOURCE, &[CLUSTER_V2, cluster_name]);
    set_cluster_v2_attributes(cluster, configs, cluster_name);

    if let Some(bastion) = terraform.proxy_bastion() {
        set_proxy_config(cluster, bastion);
    }

    let rke_config = cluster.append_block("rke_config", &[]);
    for (num, pool) in terratest.nodepools.iter().enumerate() {
        let machine_pool = rke_config.append_block("machine_pools", &[]);
        machine_pool.set_attribute_value("name", format!("pool{}", num));
        machine_pool.set_attribute_raw(
            "cloud_credential_secret_name",
            traversal(&[CLOUD_CREDENTIAL, cluster_name, "id"]),
        );
        machine_pool.set_attribute_value("control_plane_role", pool.controlplane);
        machine_pool.set_attribute_value("etcd_role", pool.etcd);
        machine_pool.set_attribute_value("worker_role", pool.worker);
        machine_pool.set_attribute_value("quantity", pool.quantity);

        let machine_config = machine_pool.append_block("machine_config", &[]);
        machine_config.set_attribute_raw("kind", traversal(&[MACHINE_CONFIG_V2, cluster_name, "kind"]));
        machine_config.set_attribute_raw("name", traversal(&[MACHINE_CONFIG_V2, cluster_name, "name"]));
    }

    debug!(
        "Added {} machine pools to {} cluster {}",
        terratest.nodepools.len(),
        module.cluster_type,
        cluster_name
    );
    Ok(())
}

/// Attributes every `rancher2_cluster_v2` carries, node-driver or custom.
pub fn set_cluster_v2_attributes(cluster: &mut Body, configs: &TfpConfigs, cluster_name: &str) {
    let terraform = &configs.terraform;
    cluster.set_attribute_value("name", cluster_name);
    cluster.set_attribute_value("kubernetes_version", configs.terratest.kubernetes_version.as_str());
    cluster.set_attribute_value("enable_network_policy", terraform.enable_network_policy);
    cluster.set_attribute_value(
        "default_pod_security_admission_configuration_template_name",
        configs.terratest.psact.as_str(),
    );
    cluster.set_attribute_value(
        "default_cluster_role_for_project_members",
        terraform.default_cluster_role_for_project_members.as_str(),
    );
}

fn set_cloud_credential(
    root: &mut Body,
    terraform: &TerraformConfig,
    provider: NodeProvider,
    cluster_name: &str,
) -> FrameworkResult<()> {
    let credential = root.append_block(RESOURCE, &[CLOUD_CREDENTIAL, cluster_name]);
    credential.set_attribute_value("name", name_or(&terraform.cloud_credential_name, cluster_name));

    match provider {
        NodeProvider::AmazonEc2 => {
            let aws = terraform.require_aws_credentials()?;
            let config = credential.append_block("amazonec2_credential_config", &[]);
            config.set_attribute_value("access_key", aws.aws_access_key.as_str());
            config.set_attribute_value("secret_key", aws.aws_secret_key.as_str());
        }
        NodeProvider::Linode => {
            let linode = terraform.require_linode_credentials()?;
            let config = credential.append_block("linode_credential_config", &[]);
            config.set_attribute_value("token", linode.linode_token.as_str());
        }
    }
    Ok(())
}

fn set_machine_config(
    root: &mut Body,
    terraform: &TerraformConfig,
    provider: NodeProvider,
    cluster_name: &str,
) {
    let machine = root.append_block(RESOURCE, &[MACHINE_CONFIG_V2, cluster_name]);
    machine.set_attribute_value("generate_name", name_or(&terraform.machine_config_name, cluster_name));

    match provider {
        NodeProvider::AmazonEc2 => {
            let aws = &terraform.aws_config;
            let config = machine.append_block("amazonec2_config", &[]);
            config.set_attribute_value("ami", aws.ami.as_str());
            config.set_attribute_value("region", aws.region.as_str());
            config.set_attribute_raw("security_group", list_of_strings(&aws.aws_security_group_names));
            config.set_attribute_value("subnet_id", aws.aws_subnet_id.as_str());
            config.set_attribute_value("vpc_id", aws.aws_vpc_id.as_str());
            config.set_attribute_value("zone", aws.aws_zone_letter.as_str());
            config.set_attribute_value("instance_type", aws.aws_instance_type.as_str());
        }
        NodeProvider::Linode => {
            let linode = &terraform.linode_config;
            let config = machine.append_block("linode_config", &[]);
            config.set_attribute_value("image", linode.linode_image.as_str());
            config.set_attribute_value("region", linode.region.as_str());
            config.set_attribute_value("root_pass", linode.linode_root_pass.as_str());
            config.set_attribute_value("token", terraform.linode_credentials.linode_token.as_str());
        }
    }
}

fn name_or<'a>(configured: &'a str, fallback: &'a str) -> &'a str {
    if configured.is_empty() {
        fallback
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::{modules, ALL_IN_ONE_NODE_POOL, ETCD_NODE_POOL, WORKER_NODE_POOL};
    use tfp_config::{ConfigError, ProxyConfig};
    use tfp_hcl::Expression;

    use crate::error::FrameworkError;

    fn configs() -> TfpConfigs {
        let mut configs = TfpConfigs::default();
        configs.terraform.aws_credentials.aws_access_key = "AKIA".to_string();
        configs.terraform.aws_credentials.aws_secret_key = "secret".to_string();
        configs.terraform.aws_config.aws_security_group_names = vec!["open-all".to_string()];
        configs.terraform.linode_credentials.linode_token = "linode-token".to_string();
        configs.terraform.cloud_credential_name = "tfp-cc".to_string();
        configs.terratest.kubernetes_version = "v1.28.9+rke2r1".to_string();
        configs.terratest.nodepools = vec![ETCD_NODE_POOL, WORKER_NODE_POOL];
        configs
    }

    #[test]
    fn test_machine_pools_per_nodepool() {
        let module = Module::parse(modules::EC2_RKE2).unwrap();
        let mut root = Body::new();
        set_rke2_k3s(&mut root, &configs(), &module, "tfp-ab12").unwrap();

        let cluster = root.find_block(RESOURCE, &[CLUSTER_V2, "tfp-ab12"]).unwrap();
        let rke_config = cluster.body.blocks_of_kind("rke_config").next().unwrap();
        let pools: Vec<_> = rke_config.body.blocks_of_kind("machine_pools").collect();
        assert_eq!(pools.len(), 2);
        assert_eq!(
            pools[1].body.attribute("name"),
            Some(&Expression::Value("pool1".into()))
        );
        assert_eq!(
            pools[0].body.attribute("cloud_credential_secret_name"),
            Some(&Expression::Raw("rancher2_cloud_credential.tfp-ab12.id".to_string()))
        );
        assert!(cluster.body.blocks_of_kind("agent_env_vars").next().is_none());
    }

    #[test]
    fn test_linode_credentials() {
        let module = Module::parse(modules::LINODE_K3S).unwrap();
        let mut root = Body::new();
        set_rke2_k3s(&mut root, &configs(), &module, "tfp").unwrap();

        let credential = root.find_block(RESOURCE, &[CLOUD_CREDENTIAL, "tfp"]).unwrap();
        assert!(credential.body.blocks_of_kind("linode_credential_config").next().is_some());
        let machine = root.find_block(RESOURCE, &[MACHINE_CONFIG_V2, "tfp"]).unwrap();
        assert!(machine.body.blocks_of_kind("linode_config").next().is_some());
    }

    #[test]
    fn test_proxy_adds_agent_env_vars() {
        let module = Module::parse(modules::EC2_K3S).unwrap();
        let mut configs = configs();
        configs.terraform.proxy = Some(ProxyConfig {
            proxy_bastion: "bastion.internal".to_string(),
        });

        let mut root = Body::new();
        set_rke2_k3s(&mut root, &configs, &module, "tfp").unwrap();

        let cluster = root.find_block(RESOURCE, &[CLUSTER_V2, "tfp"]).unwrap();
        assert_eq!(cluster.body.blocks_of_kind("agent_env_vars").count(), 3);
    }

    #[test]
    fn test_invalid_nodepool_is_rejected() {
        let module = Module::parse(modules::EC2_RKE2).unwrap();
        let mut configs = configs();
        let mut empty = ALL_IN_ONE_NODE_POOL;
        empty.quantity = 0;
        configs.terratest.nodepools = vec![ALL_IN_ONE_NODE_POOL, empty];

        let err = set_rke2_k3s(&mut Body::new(), &configs, &module, "tfp").unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Config(ConfigError::InvalidNodepool { ref pool, .. }) if pool == "pool1"
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let module = Module::parse(modules::EC2_RKE2).unwrap();
        let mut configs = configs();
        configs.terraform.aws_credentials.aws_access_key.clear();

        let err = set_rke2_k3s(&mut Body::new(), &configs, &module, "tfp").unwrap_err();
        assert!(err.to_string().contains("awsAccessKey"));
    }
}
