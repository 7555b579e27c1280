//! Block, resource and attribute names shared across the builders.

pub const TERRAFORM: &str = "terraform";
pub const REQUIRED_PROVIDERS: &str = "required_providers";
pub const PROVIDER: &str = "provider";
pub const RESOURCE: &str = "resource";
pub const LOCALS: &str = "locals";
pub const OUTPUT: &str = "output";

pub const RANCHER2: &str = "rancher2";
pub const RANCHER2_SOURCE: &str = "rancher/rancher2";
pub const AWS: &str = "aws";
pub const AWS_SOURCE: &str = "hashicorp/aws";
pub const SOURCE: &str = "source";
pub const VERSION: &str = "version";

pub const AWS_INSTANCE: &str = "aws_instance";
pub const HARVESTER_VIRTUAL_MACHINE: &str = "harvester_virtualmachine";
pub const KUBERNETES_SECRET: &str = "kubernetes_secret";
pub const NULL_RESOURCE: &str = "null_resource";

pub const CLOUD_CREDENTIAL: &str = "rancher2_cloud_credential";
pub const MACHINE_CONFIG_V2: &str = "rancher2_machine_config_v2";
pub const CLUSTER_V2: &str = "rancher2_cluster_v2";
pub const CLUSTER: &str = "rancher2_cluster";
pub const NODE_TEMPLATE: &str = "rancher2_node_template";
pub const NODE_POOL: &str = "rancher2_node_pool";

pub const LOAD_BALANCER: &str = "aws_lb";
pub const LOAD_BALANCER_TARGET_GROUP: &str = "aws_lb_target_group";
pub const LOAD_BALANCER_LISTENER: &str = "aws_lb_listener";
pub const LOAD_BALANCER_TARGET_GROUP_ATTACHMENT: &str = "aws_lb_target_group_attachment";
pub const TARGET_GROUP_PREFIX: &str = "tg_";
pub const TARGET_GROUP_INTERNAL_PREFIX: &str = "internal_tg_";

pub const CONNECTION: &str = "connection";
pub const PROVISIONER: &str = "provisioner";
pub const REMOTE_EXEC: &str = "remote-exec";
pub const INLINE: &str = "inline";
pub const ROOT_BLOCK_DEVICE: &str = "root_block_device";
pub const AGENT_ENV_VARS: &str = "agent_env_vars";

pub const ROLE_FLAGS: &str = "role_flags";
pub const ETCD_ROLE_FLAG: &str = "--etcd";
pub const CONTROL_PLANE_ROLE_FLAG: &str = "--controlplane";
pub const WORKER_ROLE_FLAG: &str = "--worker";

pub const ORIGINAL_NODE_COMMAND: &str = "original_node_command";
pub const WINDOWS_ORIGINAL_NODE_COMMAND: &str = "windows_original_node_command";
pub const INSECURE_NODE_COMMAND: &str = "insecure_node_command";
pub const INSECURE_WINDOWS_NODE_COMMAND: &str = "insecure_windows_node_command";
pub const INSECURE_WINDOWS_PROXY_NODE_COMMAND: &str = "insecure_windows_proxy_node_command";

pub const RKE2_INSTANCE_IDS: &str = "rke2_instance_ids";

/// Port the squid proxy listens on.
pub const PROXY_PORT: u16 = 3228;
pub const HTTP_PROXY: &str = "HTTP_PROXY";
pub const HTTPS_PROXY: &str = "HTTPS_PROXY";
pub const NO_PROXY: &str = "NO_PROXY";
pub const NO_PROXY_VALUE: &str = "localhost,127.0.0.0/8,10.0.0.0/8,172.0.0.0/8,192.168.0.0/16,.svc,.cluster.local,cattle-system.svc,169.254.169.25";

/// Ports fronted by the standalone load balancer.
pub const LOAD_BALANCER_PORTS: &[u16] = &[80, 443, 6443, 9345];
/// Ports fronted by the internal load balancer.
pub const INTERNAL_LOAD_BALANCER_PORTS: &[u16] = &[80, 443];

pub const AWS_PROVIDER_VERSION_ENV: &str = "AWS_PROVIDER_VERSION";
pub const HARVESTER_PROVIDER_VERSION_ENV: &str = "HARVESTER_PROVIDER_VERSION";
pub const DEFAULT_AWS_PROVIDER_VERSION: &str = "5.31.0";

/// `HTTP(S)_PROXY` value for a bastion address.
pub fn proxy_url(bastion: &str) -> String {
    format!("http://{}:{}", bastion, PROXY_PORT)
}

/// `file("path")` expression for connection private keys.
pub fn file_expression(path: &str) -> String {
    format!("file(\"{}\")", path)
}
