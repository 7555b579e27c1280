//! Custom clusters: Rancher creates the cluster object, the nodes are our own
//! instances registered with the cluster's node command.

use tfp_config::{
    validate_nodepool, ClusterType, Module, Nodepool, ProvisioningMode, TfpConfigs, ALL_IN_ONE_NODE_POOL,
};
use tfp_hcl::Body;
use tracing::debug;

use crate::defaults::*;
use crate::error::{FrameworkError, FrameworkResult};
use crate::nodedriver::rke1::set_rke1_cluster_attributes;
use crate::nodedriver::rke2k3s::set_cluster_v2_attributes;
use crate::nodedriver::set_proxy_config;
use crate::resources::instances::{
    create_airgapped_instances, create_instances, create_windows_instances, InstanceSettings,
};
use crate::resources::null_resource::{create_null_resource_with, Connection, Host};

/// Node pools of a custom cluster. A cluster without configured pools gets a
/// single all-in-one pool sized by `node_count`.
pub fn custom_nodepools(configs: &TfpConfigs) -> Vec<Nodepool> {
    let terratest = &configs.terratest;
    if !terratest.nodepools.is_empty() {
        return terratest.nodepools.clone();
    }

    vec![Nodepool {
        quantity: terratest.node_count.max(1),
        ..ALL_IN_ONE_NODE_POOL
    }]
}

/// Append the cluster object, one instance group per pool and the
/// registration of every node.
pub fn set_custom(root: &mut Body, configs: &TfpConfigs, module: &Module, cluster_name: &str) -> FrameworkResult<()> {
    let pools = custom_nodepools(configs);
    for (num, pool) in pools.iter().enumerate() {
        validate_nodepool(pool, num)?;
    }

    set_custom_cluster(root, configs, module, cluster_name);
    root.append_newline();

    let settings = InstanceSettings::aws(&configs.terraform);
    match module.mode {
        ProvisioningMode::Airgap => {
            let bastion = configs
                .terraform
                .proxy_bastion()
                .ok_or_else(|| tfp_config::ConfigError::MissingField("terraform.proxy.proxyBastion".to_string()))?;
            for (num, pool) in pools.iter().enumerate() {
                set_airgapped_pool(root, configs, module, &settings, cluster_name, num, pool, bastion);
            }
        }
        ProvisioningMode::Custom => {
            for (num, pool) in pools.iter().enumerate() {
                set_pool(root, configs, module, &settings, cluster_name, num, pool);
            }
        }
        ProvisioningMode::NodeDriver => {
            return Err(FrameworkError::Unsupported(format!(
                "{} is not a custom module",
                module.name
            )));
        }
    }

    debug!("Added {} custom pools to cluster {}", pools.len(), cluster_name);
    Ok(())
}

/// Windows workers joining an existing custom cluster, named `<cluster>-windows`.
pub fn set_custom_windows(root: &mut Body, configs: &TfpConfigs, cluster_name: &str) -> FrameworkResult<()> {
    let terraform = &configs.terraform;
    let count = configs.terratest.windows_node_count;
    if count <= 0 {
        return Err(FrameworkError::Unsupported(
            "terratest.windowsNodeCount must be positive for Windows nodes".to_string(),
        ));
    }

    let settings = InstanceSettings::aws(terraform);
    create_windows_instances(root, &settings, count, cluster_name);
    root.append_newline();

    let command = match terraform.proxy_bastion() {
        Some(_) => INSECURE_WINDOWS_PROXY_NODE_COMMAND,
        None => INSECURE_WINDOWS_NODE_COMMAND,
    };

    let host = format!("{}.{}-windows[count.index].public_ip", AWS_INSTANCE, cluster_name);
    let connection = Connection {
        user: &settings.windows_user,
        private_key_path: &settings.windows_private_key_path,
        host: Host::Expression(&host),
        bastion: None,
        windows: true,
    };
    create_null_resource_with(root, &format!("{}_windows_register", cluster_name), Some(count), &connection)
        .set_attribute_raw(INLINE, format!("[\"${{local.{}_{}}}\"]", cluster_name, command));
    root.append_newline();

    Ok(())
}

fn set_custom_cluster(root: &mut Body, configs: &TfpConfigs, module: &Module, cluster_name: &str) {
    // Airgap bastions only relay SSH, there is no squid behind them
    let proxy = match module.mode {
        ProvisioningMode::Airgap => None,
        _ => configs.terraform.proxy_bastion(),
    };

    match module.cluster_type {
        ClusterType::Rke1 => {
            let cluster = root.append_block(RESOURCE, &[CLUSTER, cluster_name]);
            set_rke1_cluster_attributes(cluster, configs, cluster_name, proxy);
        }
        ClusterType::Rke2 | ClusterType::K3s => {
            let cluster = root.append_block(RESOURCE, &[CLUSTER_V2, cluster_name]);
            set_cluster_v2_attributes(cluster, configs, cluster_name);
            if let Some(bastion) = proxy {
                set_proxy_config(cluster, bastion);
            }
        }
    }
}

/// `"${<node command>} --etcd --controlplane"` for the pool's roles.
fn registration_command(module: &Module, cluster_name: &str, pool: &Nodepool) -> String {
    let node_command = match module.cluster_type {
        ClusterType::Rke1 => format!(
            "{}.{}.cluster_registration_token[0].insecure_node_command",
            CLUSTER, cluster_name
        ),
        ClusterType::Rke2 | ClusterType::K3s => format!("local.{}_{}", cluster_name, INSECURE_NODE_COMMAND),
    };

    let mut command = format!("${{{}}}", node_command);
    for flag in pool.role_flags() {
        command.push(' ');
        command.push_str(flag);
    }
    format!("[\"{}\"]", command)
}

fn set_pool(
    root: &mut Body,
    configs: &TfpConfigs,
    module: &Module,
    settings: &InstanceSettings,
    cluster_name: &str,
    num: usize,
    pool: &Nodepool,
) {
    let pool_name = format!("{}_pool{}", cluster_name, num);
    create_instances(root, settings, Some(pool.quantity), &pool_name);
    root.append_newline();

    let host = format!("{}.{}[count.index].public_ip", AWS_INSTANCE, pool_name);
    let connection = Connection {
        user: &settings.user,
        private_key_path: &configs.terraform.private_key_path,
        host: Host::Expression(&host),
        bastion: None,
        windows: false,
    };
    create_null_resource_with(root, &format!("{}_register", pool_name), Some(pool.quantity), &connection)
        .set_attribute_raw(INLINE, registration_command(module, cluster_name, pool));
    root.append_newline();
}

/// Airgapped instances take no `count`, so every node is its own resource.
#[allow(clippy::too_many_arguments)]
fn set_airgapped_pool(
    root: &mut Body,
    configs: &TfpConfigs,
    module: &Module,
    settings: &InstanceSettings,
    cluster_name: &str,
    num: usize,
    pool: &Nodepool,
    bastion: &str,
) {
    for index in 0..pool.quantity {
        let node_name = format!("{}_pool{}_{}", cluster_name, num, index);
        create_airgapped_instances(root, settings, &node_name);
        root.append_newline();

        let host = format!("{}.{}.private_ip", AWS_INSTANCE, node_name);
        let connection = Connection {
            user: &settings.user,
            private_key_path: &configs.terraform.private_key_path,
            host: Host::Expression(&host),
            bastion: Some(bastion),
            windows: false,
        };
        create_null_resource_with(root, &format!("{}_register", node_name), None, &connection)
            .set_attribute_raw(INLINE, registration_command(module, cluster_name, pool));
        root.append_newline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::{modules, ProxyConfig, ETCD_NODE_POOL, WORKER_NODE_POOL};
    use tfp_hcl::Expression;

    fn configs(module: &str) -> TfpConfigs {
        let mut configs = TfpConfigs::default();
        configs.terraform.module = module.to_string();
        configs.terraform.resource_prefix = "tfp".to_string();
        configs.terraform.private_key_path = "/keys/id.pem".to_string();
        configs.terraform.windows_private_key_path = "/keys/win.pem".to_string();
        configs.terraform.aws_config.aws_user = "ubuntu".to_string();
        configs.terraform.aws_config.windows_aws_user = "Administrator".to_string();
        configs.terratest.kubernetes_version = "v1.28.9+rke2r1".to_string();
        configs
    }

    fn inline(root: &Body, name: &str) -> String {
        let resource = root.find_block(RESOURCE, &[NULL_RESOURCE, name]).unwrap();
        let provisioner = resource.body.find_block(PROVISIONER, &[REMOTE_EXEC]).unwrap();
        provisioner.body.attribute(INLINE).and_then(Expression::as_raw).unwrap().to_string()
    }

    #[test]
    fn test_custom_rke2_pools() {
        let mut configs = configs(modules::CUSTOM_EC2_RKE2);
        configs.terratest.nodepools = vec![ETCD_NODE_POOL, Nodepool { quantity: 2, ..WORKER_NODE_POOL }];
        let module = Module::parse(modules::CUSTOM_EC2_RKE2).unwrap();

        let mut root = Body::new();
        set_custom(&mut root, &configs, &module, "c1").unwrap();

        let cluster = root.find_block(RESOURCE, &[CLUSTER_V2, "c1"]).unwrap();
        assert!(cluster.body.find_block("rke_config", &[]).is_none());

        let workers = root.find_block(RESOURCE, &[AWS_INSTANCE, "c1_pool1"]).unwrap();
        assert_eq!(workers.body.attribute("count"), Some(&Expression::Value(2i64.into())));

        assert_eq!(inline(&root, "c1_pool0_register"), r#"["${local.c1_insecure_node_command} --etcd"]"#);
        assert_eq!(inline(&root, "c1_pool1_register"), r#"["${local.c1_insecure_node_command} --worker"]"#);
    }

    #[test]
    fn test_custom_rke1_uses_cluster_token() {
        let configs = configs(modules::CUSTOM_EC2_RKE1);
        let module = Module::parse(modules::CUSTOM_EC2_RKE1).unwrap();

        let mut root = Body::new();
        set_custom(&mut root, &configs, &module, "c1").unwrap();

        assert!(root.find_block(RESOURCE, &[CLUSTER, "c1"]).is_some());
        assert_eq!(
            inline(&root, "c1_pool0_register"),
            r#"["${rancher2_cluster.c1.cluster_registration_token[0].insecure_node_command} --etcd --controlplane --worker"]"#
        );
    }

    #[test]
    fn test_empty_pools_default_to_all_in_one() {
        let mut configs = configs(modules::CUSTOM_EC2_RKE2_WINDOWS);
        configs.terratest.node_count = 3;
        let pools = custom_nodepools(&configs);
        assert_eq!(pools, vec![Nodepool { quantity: 3, ..ALL_IN_ONE_NODE_POOL }]);

        configs.terratest.node_count = 0;
        assert_eq!(custom_nodepools(&configs)[0].quantity, 1);
    }

    #[test]
    fn test_airgap_requires_bastion() {
        let configs = configs(modules::AIRGAP_RKE2);
        let module = Module::parse(modules::AIRGAP_RKE2).unwrap();
        let err = set_custom(&mut Body::new(), &configs, &module, "c1").unwrap_err();
        assert!(matches!(err, FrameworkError::Config(_)));
    }

    #[test]
    fn test_airgap_nodes_register_through_bastion() {
        let mut configs = configs(modules::AIRGAP_K3S);
        configs.terraform.proxy = Some(ProxyConfig {
            proxy_bastion: "bastion.example".to_string(),
        });
        configs.terratest.node_count = 2;
        let module = Module::parse(modules::AIRGAP_K3S).unwrap();

        let mut root = Body::new();
        set_custom(&mut root, &configs, &module, "c1").unwrap();

        assert!(root.find_block(RESOURCE, &[AWS_INSTANCE, "c1_pool0_1"]).is_some());
        let register = root.find_block(RESOURCE, &[NULL_RESOURCE, "c1_pool0_0_register"]).unwrap();
        let connection = register.body.blocks_of_kind(CONNECTION).next().unwrap();
        assert_eq!(
            connection.body.attribute("bastion_host"),
            Some(&Expression::Value("bastion.example".into()))
        );
    }

    #[test]
    fn test_airgap_clusters_skip_agent_proxy() {
        for name in [modules::AIRGAP_RKE1, modules::AIRGAP_RKE2] {
            let mut configs = configs(name);
            configs.terraform.proxy = Some(ProxyConfig {
                proxy_bastion: "bastion.example".to_string(),
            });
            let module = Module::parse(name).unwrap();

            let mut root = Body::new();
            set_custom(&mut root, &configs, &module, "c1").unwrap();

            let cluster = root
                .find_block(RESOURCE, &[CLUSTER_V2, "c1"])
                .or_else(|| root.find_block(RESOURCE, &[CLUSTER, "c1"]))
                .unwrap();
            assert_eq!(cluster.body.blocks_of_kind(AGENT_ENV_VARS).count(), 0, "{}", name);
        }
    }

    #[test]
    fn test_custom_clusters_behind_proxy_get_agent_env() {
        let mut configs = configs(modules::CUSTOM_EC2_RKE2);
        configs.terraform.proxy = Some(ProxyConfig {
            proxy_bastion: "bastion.example".to_string(),
        });
        let module = Module::parse(modules::CUSTOM_EC2_RKE2).unwrap();

        let mut root = Body::new();
        set_custom(&mut root, &configs, &module, "c1").unwrap();

        let cluster = root.find_block(RESOURCE, &[CLUSTER_V2, "c1"]).unwrap();
        assert_eq!(cluster.body.blocks_of_kind(AGENT_ENV_VARS).count(), 3);
    }

    #[test]
    fn test_windows_registration() {
        let mut configs = configs(modules::CUSTOM_EC2_RKE2_WINDOWS);
        configs.terratest.windows_node_count = 2;

        let mut root = Body::new();
        set_custom_windows(&mut root, &configs, "c1").unwrap();
        assert!(root.find_block(RESOURCE, &[AWS_INSTANCE, "c1-windows"]).is_some());
        assert_eq!(inline(&root, "c1_windows_register"), r#"["${local.c1_insecure_windows_node_command}"]"#);

        configs.terraform.proxy = Some(ProxyConfig {
            proxy_bastion: "10.0.0.1".to_string(),
        });
        let mut root = Body::new();
        set_custom_windows(&mut root, &configs, "c1").unwrap();
        assert_eq!(
            inline(&root, "c1_windows_register"),
            r#"["${local.c1_insecure_windows_proxy_node_command}"]"#
        );
    }

    #[test]
    fn test_windows_requires_count() {
        let configs = configs(modules::CUSTOM_EC2_RKE2_WINDOWS);
        assert!(set_custom_windows(&mut Body::new(), &configs, "c1").is_err());
    }
}
