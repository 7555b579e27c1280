//! RKE1 clusters: a node template, a `rancher2_cluster` and one node pool
//! per configured pool.

use tfp_config::{validate_nodepool, Module, NodeProvider, TerraformConfig, TfpConfigs};
use tfp_hcl::{list_of_strings, traversal, Body};

use super::set_proxy_config;
use crate::defaults::{CLUSTER, NODE_POOL, NODE_TEMPLATE, RESOURCE};
use crate::error::FrameworkResult;

pub fn set_rke1(
    root: &mut Body,
    configs: &TfpConfigs,
    module: &Module,
    cluster_name: &str,
) -> FrameworkResult<()> {
    let terraform = &configs.terraform;

    for (num, pool) in configs.terratest.nodepools.iter().enumerate() {
        validate_nodepool(pool, num)?;
    }

    let template = root.append_block(RESOURCE, &[NODE_TEMPLATE, cluster_name]);
    template.set_attribute_value("name", cluster_name);
    match module.provider {
        NodeProvider::AmazonEc2 => set_aws_rke1_provider(template, terraform)?,
        NodeProvider::Linode => set_linode_rke1_provider(template, terraform)?,
    }
    root.append_newline();

    let cluster = root.append_block(RESOURCE, &[CLUSTER, cluster_name]);
    set_rke1_cluster_attributes(cluster, configs, cluster_name, terraform.proxy_bastion());
    root.append_newline();

    for (num, pool) in configs.terratest.nodepools.iter().enumerate() {
        let pool_name = format!("pool{}", num);
        let node_pool = root.append_block(RESOURCE, &[NODE_POOL, &format!("{}_{}", cluster_name, pool_name)]);
        node_pool.set_attribute_raw("cluster_id", traversal(&[CLUSTER, cluster_name, "id"]));
        node_pool.set_attribute_value("name", pool_name.as_str());
        node_pool.set_attribute_value(
            "hostname_prefix",
            format!("{}-{}", terraform.resource_prefix, pool_name),
        );
        node_pool.set_attribute_raw("node_template_id", traversal(&[NODE_TEMPLATE, cluster_name, "id"]));
        node_pool.set_attribute_value("quantity", pool.quantity);
        node_pool.set_attribute_value("control_plane", pool.controlplane);
        node_pool.set_attribute_value("etcd", pool.etcd);
        node_pool.set_attribute_value("worker", pool.worker);
        root.append_newline();
    }

    Ok(())
}

/// `rancher2_cluster` attributes shared by node-driver and custom RKE1. With
/// a `proxy` bastion the agents are routed through its squid proxy.
pub fn set_rke1_cluster_attributes(cluster: &mut Body, configs: &TfpConfigs, cluster_name: &str, proxy: Option<&str>) {
    let terraform = &configs.terraform;

    cluster.set_attribute_value("name", cluster_name);
    if !configs.terratest.psact.is_empty() {
        cluster.set_attribute_value(
            "default_pod_security_admission_configuration_template_name",
            configs.terratest.psact.as_str(),
        );
    }
    cluster.set_attribute_value("enable_network_policy", terraform.enable_network_policy);
    cluster.set_attribute_value(
        "default_cluster_role_for_project_members",
        terraform.default_cluster_role_for_project_members.as_str(),
    );

    if let Some(bastion) = proxy {
        set_proxy_config(cluster, bastion);
    }

    let rke_config = cluster.append_block("rke_config", &[]);
    rke_config.set_attribute_value("kubernetes_version", configs.terratest.kubernetes_version.as_str());
    rke_config
        .append_block("network", &[])
        .set_attribute_value("plugin", terraform.network_plugin.as_str());
}

fn set_aws_rke1_provider(template: &mut Body, terraform: &TerraformConfig) -> FrameworkResult<()> {
    let credentials = terraform.require_aws_credentials()?;
    let aws = &terraform.aws_config;

    let config = template.append_block("amazonec2_config", &[]);
    config.set_attribute_value("access_key", credentials.aws_access_key.as_str());
    config.set_attribute_value("secret_key", credentials.aws_secret_key.as_str());
    config.set_attribute_value("ami", aws.ami.as_str());
    config.set_attribute_value("region", aws.region.as_str());
    config.set_attribute_raw("security_group", list_of_strings(&aws.aws_security_group_names));
    config.set_attribute_value("subnet_id", aws.aws_subnet_id.as_str());
    config.set_attribute_value("vpc_id", aws.aws_vpc_id.as_str());
    config.set_attribute_value("zone", aws.aws_zone_letter.as_str());
    config.set_attribute_value("root_size", aws.aws_root_size);
    config.set_attribute_value("instance_type", aws.aws_instance_type.as_str());
    Ok(())
}

fn set_linode_rke1_provider(template: &mut Body, terraform: &TerraformConfig) -> FrameworkResult<()> {
    let credentials = terraform.require_linode_credentials()?;
    let linode = &terraform.linode_config;

    let config = template.append_block("linode_config", &[]);
    config.set_attribute_value("image", linode.linode_image.as_str());
    config.set_attribute_value("instance_type", linode.linode_instance_type.as_str());
    config.set_attribute_value("region", linode.region.as_str());
    config.set_attribute_value("root_pass", linode.linode_root_pass.as_str());
    config.set_attribute_value("token", credentials.linode_token.as_str());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::{modules, CONTROL_PLANE_NODE_POOL, ETCD_NODE_POOL, WORKER_NODE_POOL};
    use tfp_hcl::{Expression, HclFile};

    fn configs() -> TfpConfigs {
        let mut configs = TfpConfigs::default();
        configs.terraform.aws_credentials.aws_access_key = "AKIA".to_string();
        configs.terraform.aws_credentials.aws_secret_key = "secret".to_string();
        configs.terraform.aws_config.aws_security_group_names = vec!["open-all".to_string()];
        configs.terraform.aws_config.aws_root_size = 100;
        configs.terratest.kubernetes_version = "v1.27.10-rancher1-1".to_string();
        configs.terratest.nodepools = vec![ETCD_NODE_POOL, CONTROL_PLANE_NODE_POOL, WORKER_NODE_POOL];
        configs
    }

    #[test]
    fn test_node_pools_reference_template_and_cluster() {
        let module = Module::parse(modules::EC2_RKE1).unwrap();
        let mut file = HclFile::new();
        set_rke1(file.body_mut(), &configs(), &module, "tfp-x1").unwrap();

        let pools: Vec<_> = file
            .body()
            .blocks()
            .filter(|b| b.labels.first().map(String::as_str) == Some(NODE_POOL))
            .collect();
        assert_eq!(pools.len(), 3);
        assert_eq!(pools[2].labels[1], "tfp-x1_pool2");
        assert_eq!(
            pools[0].body.attribute("node_template_id"),
            Some(&Expression::Raw("rancher2_node_template.tfp-x1.id".to_string()))
        );
        assert_eq!(
            pools[1].body.attribute("hostname_prefix"),
            Some(&Expression::Value("tfp-pool1".into()))
        );

        let text = file.to_string();
        assert!(text.contains("plugin = \"canal\""));
        assert!(text.contains("security_group = [\"open-all\"]"));
    }

    #[test]
    fn test_linode_template() {
        let module = Module::parse(modules::LINODE_RKE1).unwrap();
        let mut configs = configs();
        configs.terraform.linode_credentials.linode_token = "tok".to_string();
        configs.terraform.linode_config.linode_image = "linode/ubuntu22.04".to_string();

        let mut root = Body::new();
        set_rke1(&mut root, &configs, &module, "tfp").unwrap();

        let template = root.find_block(RESOURCE, &[NODE_TEMPLATE, "tfp"]).unwrap();
        let linode = template.body.blocks_of_kind("linode_config").next().unwrap();
        assert_eq!(
            linode.body.attribute("image"),
            Some(&Expression::Value("linode/ubuntu22.04".into()))
        );
    }
}
