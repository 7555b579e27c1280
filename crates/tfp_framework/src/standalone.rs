//! Standalone Rancher environments built in phases.
//!
//! Each phase appends to the same document, rewrites main.tf and applies it.
//! Later phases need addresses that only exist after an apply, which are read
//! back from Terraform outputs.

use std::path::Path;

use tfp_config::{TerraformConfig, TfpConfigs};
use tfp_hcl::HclFile;
use tfp_runner::{init_and_apply, Terraform, TerraformOptions};
use tracing::{error, info};

use crate::defaults::{REQUIRED_PROVIDERS, TERRAFORM};
use crate::error::FrameworkResult;
use crate::providers::{aws_provider_block, aws_required_provider};
use crate::resources::providers::{private_ip_output, public_dns_output, tunnel_to_provider};
use crate::resources::rancher::{
    create_airgap_rancher, create_non_auth_registry, create_proxied_rancher, create_rancher, create_servers,
    create_squid_proxy, upgrade_airgap_rancher, upgrade_proxied_rancher, upgrade_rancher, RancherRelease,
    ScriptLibrary,
};
use crate::resources::{Distro, ServerNode};
use crate::set_config::MAIN_TF;

pub const BASTION: &str = "bastion";
pub const REGISTRY: &str = "registry";
/// Resource name of the registry mirror job.
pub const NON_AUTH_REGISTRY: &str = "non_auth_registry";

/// Hosts of a standalone environment, as read back after apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandaloneNodes {
    pub servers: Vec<ServerNode>,
    pub bastion: Option<ServerNode>,
    pub registry: Option<ServerNode>,
}

impl StandaloneNodes {
    /// The server Rancher is installed from.
    pub fn first_server(&self) -> Option<&ServerNode> {
        self.servers.first()
    }
}

/// Options for a scenario directory.
pub fn setup(configs: &TfpConfigs, key_path: &Path) -> TerraformOptions {
    let mut options = TerraformOptions::new(key_path);
    let region = &configs.terraform.aws_config.region;
    if !region.is_empty() {
        options = options.env("AWS_DEFAULT_REGION", region.as_str());
    }
    options
}

/// Three servers, Kubernetes on them, then Rancher on top.
pub async fn create_sanity_main_tf<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
) -> FrameworkResult<StandaloneNodes> {
    let distro = Distro::from_standalone(&terraform.standalone)?;
    let names = distro.server_names();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let mut file = HclFile::new();
    tunnel_to_provider(&terraform.provider)?.create_non_airgap(&mut file, terraform, &name_refs)?;
    info!("Creating {} servers...", distro.as_str());
    apply_phase(tf, options, &file).await?;

    let servers = read_public_nodes(tf, options, &names).await?;

    create_servers(file.body_mut(), terraform, scripts, distro, &servers, None, None)?;
    info!("Bootstrapping {} cluster...", distro.as_str());
    apply_phase(tf, options, &file).await?;

    create_rancher(file.body_mut(), terraform, scripts, &servers[0].public_dns)?;
    info!("Installing Rancher...");
    apply_phase(tf, options, &file).await?;

    Ok(StandaloneNodes {
        servers,
        bastion: None,
        registry: None,
    })
}

/// A squid proxy on a bastion, three servers whose traffic goes through it,
/// then Rancher configured with the proxy.
pub async fn create_proxy_main_tf<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
) -> FrameworkResult<StandaloneNodes> {
    let distro = Distro::from_standalone(&terraform.standalone)?;
    let names = distro.server_names();
    let mut hosts: Vec<&str> = vec![BASTION];
    hosts.extend(names.iter().map(String::as_str));

    let mut file = HclFile::new();
    tunnel_to_provider(&terraform.provider)?.create_non_airgap(&mut file, terraform, &hosts)?;
    info!("Creating bastion and servers...");
    apply_phase(tf, options, &file).await?;

    let bastion = read_public_node(tf, options, BASTION).await?;
    let servers = read_public_nodes(tf, options, &names).await?;
    let private_ips: Vec<&str> = servers.iter().map(|s| s.private_ip.as_str()).collect();

    create_squid_proxy(file.body_mut(), terraform, scripts, &bastion.public_dns, &private_ips)?;
    info!("Installing squid proxy and {} cluster...", distro.as_str());
    apply_phase(tf, options, &file).await?;

    create_proxied_rancher(
        file.body_mut(),
        terraform,
        scripts,
        &bastion.private_ip,
        &servers[0].public_dns,
    )?;
    info!("Installing Rancher behind the proxy...");
    apply_phase(tf, options, &file).await?;

    Ok(StandaloneNodes {
        servers,
        bastion: Some(bastion),
        registry: None,
    })
}

/// Servers without public addresses pulling every image from a registry;
/// everything is driven from the bastion.
pub async fn create_airgap_main_tf<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
) -> FrameworkResult<StandaloneNodes> {
    let distro = Distro::from_standalone(&terraform.standalone)?;
    let names = distro.server_names();
    let airgapped: Vec<&str> = names.iter().map(String::as_str).collect();

    let mut file = HclFile::new();
    tunnel_to_provider(&terraform.provider)?.create_airgap(&mut file, terraform, &[BASTION, REGISTRY], &airgapped)?;
    info!("Creating bastion, registry and airgapped servers...");
    apply_phase(tf, options, &file).await?;

    let bastion = read_public_node(tf, options, BASTION).await?;
    let registry = read_public_node(tf, options, REGISTRY).await?;
    let mut servers = Vec::with_capacity(names.len());
    for name in &names {
        servers.push(ServerNode {
            name: name.clone(),
            public_dns: String::new(),
            private_ip: tf.output(options, &private_ip_output(name)).await?,
        });
    }

    let release = RancherRelease::initial(&terraform.standalone);
    create_non_auth_registry(
        file.body_mut(),
        terraform,
        scripts,
        &release,
        &registry.public_dns,
        NON_AUTH_REGISTRY,
    )?;
    info!("Populating private registry...");
    apply_phase(tf, options, &file).await?;

    create_servers(
        file.body_mut(),
        terraform,
        scripts,
        distro,
        &servers,
        Some(&registry.public_dns),
        Some(&bastion.public_dns),
    )?;
    info!("Bootstrapping airgapped {} cluster...", distro.as_str());
    apply_phase(tf, options, &file).await?;

    create_airgap_rancher(file.body_mut(), terraform, scripts, &registry.public_dns, &bastion.public_dns)?;
    info!("Installing airgapped Rancher...");
    apply_phase(tf, options, &file).await?;

    Ok(StandaloneNodes {
        servers,
        bastion: Some(bastion),
        registry: Some(registry),
    })
}

/// Upgrade an environment created by one of the flows above. The upgrade
/// kind is picked from the standalone flags: airgap, then proxy, then plain.
/// Returns whether an upgrade was applied.
pub async fn create_upgrade_main_tf<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    nodes: &StandaloneNodes,
) -> FrameworkResult<bool> {
    let standalone = &terraform.standalone;

    let mut file = HclFile::new();
    {
        let root = file.body_mut();
        aws_required_provider(root.append_block(TERRAFORM, &[]).append_block(REQUIRED_PROVIDERS, &[]));
        root.append_newline();
        aws_provider_block(root, terraform)?;
        root.append_newline();
    }

    let server = nodes.first_server().map(|s| s.public_dns.as_str()).unwrap_or_default();
    let bastion = nodes.bastion.as_ref();

    match (&nodes.registry, bastion) {
        (Some(registry), Some(bastion)) if standalone.upgrade_airgap_rancher => {
            info!("Updating private registry...");
            let release = RancherRelease::upgraded(standalone);
            create_non_auth_registry(
                file.body_mut(),
                terraform,
                scripts,
                &release,
                &registry.public_dns,
                NON_AUTH_REGISTRY,
            )?;
            apply_phase(tf, options, &file).await?;

            info!("Upgrading airgap Rancher...");
            upgrade_airgap_rancher(file.body_mut(), terraform, scripts, &registry.public_dns, &bastion.public_dns)?;
            apply_phase(tf, options, &file).await?;
        }
        (_, Some(proxy)) if standalone.upgrade_proxy_rancher => {
            info!("Upgrading proxy Rancher...");
            upgrade_proxied_rancher(file.body_mut(), terraform, scripts, &proxy.private_ip, server)?;
            apply_phase(tf, options, &file).await?;
        }
        _ if standalone.upgrade_rancher => {
            info!("Upgrading Rancher...");
            upgrade_rancher(file.body_mut(), terraform, scripts, server)?;
            apply_phase(tf, options, &file).await?;
        }
        _ => {
            error!("Unsupported Rancher environment. Please check the configuration file.");
            return Ok(false);
        }
    }

    Ok(true)
}

async fn apply_phase<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    file: &HclFile,
) -> FrameworkResult<()> {
    std::fs::create_dir_all(options.dir())?;
    file.write_to(options.dir().join(MAIN_TF))?;
    init_and_apply(tf, options).await?;
    Ok(())
}

async fn read_public_node<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    name: &str,
) -> FrameworkResult<ServerNode> {
    Ok(ServerNode {
        name: name.to_string(),
        public_dns: tf.output(options, &public_dns_output(name)).await?,
        private_ip: tf.output(options, &private_ip_output(name)).await?,
    })
}

async fn read_public_nodes<T: Terraform + ?Sized>(
    tf: &T,
    options: &TerraformOptions,
    names: &[String],
) -> FrameworkResult<Vec<ServerNode>> {
    let mut nodes = Vec::with_capacity(names.len());
    for name in names {
        nodes.push(read_public_node(tf, options, name).await?);
    }
    Ok(nodes)
}
