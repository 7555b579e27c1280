//! Infrastructure backends for the standalone environment.

use tfp_config::{StandaloneProvider, TerraformConfig};
use tfp_hcl::{traversal, Body, HclFile};
use tracing::debug;

use super::instances::{create_airgapped_instances, create_instances, InstanceSettings};
use super::load_balancer::{create_instance_ids_local, create_internal_load_balancer, create_load_balancer};
use crate::defaults::*;
use crate::error::FrameworkResult;
use crate::providers::{aws_provider_block, aws_required_provider, harvester_provider_block, harvester_required_provider};

/// Output name suffixes read back after an apply.
pub const PUBLIC_DNS_OUTPUT: &str = "public_dns";
pub const PRIVATE_IP_OUTPUT: &str = "private_ip";

/// `<host>_public_dns`
pub fn public_dns_output(host: &str) -> String {
    format!("{}_{}", host, PUBLIC_DNS_OUTPUT)
}

/// `<host>_private_ip`
pub fn private_ip_output(host: &str) -> String {
    format!("{}_{}", host, PRIVATE_IP_OUTPUT)
}

/// Creates the hosts of a standalone environment on one backend.
pub trait ProviderResources: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provider blocks, hosts with public addresses, the load balancer in
    /// front of the servers and an output per host address.
    fn create_non_airgap(&self, file: &mut HclFile, terraform: &TerraformConfig, instances: &[&str])
        -> FrameworkResult<()>;

    /// Like [`ProviderResources::create_non_airgap`], but `airgapped` hosts
    /// only get a private address and sit behind an internal load balancer.
    fn create_airgap(
        &self,
        file: &mut HclFile,
        terraform: &TerraformConfig,
        public: &[&str],
        airgapped: &[&str],
    ) -> FrameworkResult<()>;
}

/// Pick the backend named by `terraform.provider`.
pub fn tunnel_to_provider(provider: &str) -> FrameworkResult<Box<dyn ProviderResources>> {
    let resources: Box<dyn ProviderResources> = match StandaloneProvider::parse(provider)? {
        StandaloneProvider::Aws => Box::new(AwsResources),
        StandaloneProvider::Harvester => Box::new(HarvesterResources),
    };
    debug!("Using {} resources", resources.name());
    Ok(resources)
}

pub struct AwsResources;

impl ProviderResources for AwsResources {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn create_non_airgap(
        &self,
        file: &mut HclFile,
        terraform: &TerraformConfig,
        instances: &[&str],
    ) -> FrameworkResult<()> {
        let root = file.body_mut();
        aws_required_provider(required_providers(root));
        root.append_newline();
        aws_provider_block(root, terraform)?;
        root.append_newline();

        let settings = InstanceSettings::aws(terraform);
        create_public_hosts(root, &settings, instances, &terraform.aws_config.aws_vpc_id);
        Ok(())
    }

    fn create_airgap(
        &self,
        file: &mut HclFile,
        terraform: &TerraformConfig,
        public: &[&str],
        airgapped: &[&str],
    ) -> FrameworkResult<()> {
        let root = file.body_mut();
        aws_required_provider(required_providers(root));
        root.append_newline();
        aws_provider_block(root, terraform)?;
        root.append_newline();

        let settings = InstanceSettings::aws(terraform);
        create_airgapped_hosts(root, &settings, public, airgapped, &terraform.aws_config.aws_vpc_id);
        Ok(())
    }
}

/// Harvester hosts are created through its EC2-compatible API.
pub struct HarvesterResources;

impl ProviderResources for HarvesterResources {
    fn name(&self) -> &'static str {
        "harvester"
    }

    fn create_non_airgap(
        &self,
        file: &mut HclFile,
        terraform: &TerraformConfig,
        instances: &[&str],
    ) -> FrameworkResult<()> {
        let root = file.body_mut();
        harvester_required_provider(required_providers(root));
        root.append_newline();
        harvester_provider_block(root, terraform)?;
        root.append_newline();

        let settings = InstanceSettings::harvester(terraform);
        create_public_hosts(root, &settings, instances, &terraform.harvester_config.harvester_vpc_id);
        Ok(())
    }

    fn create_airgap(
        &self,
        file: &mut HclFile,
        terraform: &TerraformConfig,
        public: &[&str],
        airgapped: &[&str],
    ) -> FrameworkResult<()> {
        let root = file.body_mut();
        harvester_required_provider(required_providers(root));
        root.append_newline();
        harvester_provider_block(root, terraform)?;
        root.append_newline();

        let settings = InstanceSettings::harvester(terraform);
        create_airgapped_hosts(
            root,
            &settings,
            public,
            airgapped,
            &terraform.harvester_config.harvester_vpc_id,
        );
        Ok(())
    }
}

/// The `required_providers` block inside the document's `terraform` block,
/// created on first use.
fn required_providers(root: &mut Body) -> &mut Body {
    if root.find_block(TERRAFORM, &[]).is_none() {
        root.append_block(TERRAFORM, &[]).append_block(REQUIRED_PROVIDERS, &[]);
    }

    let terraform = match root.find_block_mut(TERRAFORM, &[]) {
        Some(block) => &mut block.body,
        None => unreachable!("terraform block was just created"),
    };
    if terraform.find_block(REQUIRED_PROVIDERS, &[]).is_none() {
        terraform.append_block(REQUIRED_PROVIDERS, &[]);
    }
    match terraform.find_block_mut(REQUIRED_PROVIDERS, &[]) {
        Some(block) => &mut block.body,
        None => unreachable!("required_providers block was just created"),
    }
}

fn create_public_hosts(root: &mut Body, settings: &InstanceSettings, instances: &[&str], vpc_id: &str) {
    for host in instances {
        create_instances(root, settings, None, host);
        root.append_newline();
    }

    let servers = servers_of(instances);
    if !servers.is_empty() {
        create_instance_ids_local(root, settings.resource_type, &servers);
        create_load_balancer(root, &settings.resource_prefix, &settings.subnet_id, vpc_id);
    }

    for host in instances {
        create_output(root, &public_dns_output(host), settings.resource_type, host, PUBLIC_DNS_OUTPUT);
        create_output(root, &private_ip_output(host), settings.resource_type, host, PRIVATE_IP_OUTPUT);
    }
}

fn create_airgapped_hosts(
    root: &mut Body,
    settings: &InstanceSettings,
    public: &[&str],
    airgapped: &[&str],
    vpc_id: &str,
) {
    for host in public {
        create_instances(root, settings, None, host);
        root.append_newline();
    }
    for host in airgapped {
        create_airgapped_instances(root, settings, host);
        root.append_newline();
    }

    let servers = servers_of(airgapped);
    if !servers.is_empty() {
        create_instance_ids_local(root, AWS_INSTANCE, &servers);
        create_load_balancer(root, &settings.resource_prefix, &settings.subnet_id, vpc_id);
        create_internal_load_balancer(root, &settings.resource_prefix, &settings.subnet_id, vpc_id);
    }

    for host in public {
        create_output(root, &public_dns_output(host), settings.resource_type, host, PUBLIC_DNS_OUTPUT);
        create_output(root, &private_ip_output(host), settings.resource_type, host, PRIVATE_IP_OUTPUT);
    }
    for host in airgapped {
        create_output(root, &private_ip_output(host), AWS_INSTANCE, host, PRIVATE_IP_OUTPUT);
    }
}

fn servers_of<'a>(hosts: &[&'a str]) -> Vec<&'a str> {
    hosts.iter().copied().filter(|h| h.contains("_server")).collect()
}

fn create_output(root: &mut Body, name: &str, resource_type: &str, host: &str, attribute: &str) {
    root.append_block(OUTPUT, &[name])
        .set_attribute_raw("value", traversal(&[resource_type, host, attribute]));
    root.append_newline();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameworkError;
    use tfp_hcl::Expression;

    fn terraform() -> TerraformConfig {
        let mut terraform = TerraformConfig::default();
        terraform.resource_prefix = "tfp".to_string();
        terraform.aws_credentials.aws_access_key = "access".to_string();
        terraform.aws_credentials.aws_secret_key = "secret".to_string();
        terraform.harvester_credentials.harvester_access_key = "access".to_string();
        terraform.harvester_credentials.harvester_secret_key = "secret".to_string();
        terraform
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let err = tunnel_to_provider("linode").err().unwrap();
        assert!(matches!(err, FrameworkError::Config(_)));
        assert_eq!(tunnel_to_provider("harvester").unwrap().name(), "harvester");
    }

    #[test]
    fn test_aws_non_airgap() {
        let mut file = HclFile::new();
        tunnel_to_provider("aws")
            .unwrap()
            .create_non_airgap(&mut file, &terraform(), &["rke2_server1", "rke2_server2"])
            .unwrap();

        let root = file.body();
        let required = &root.find_block(TERRAFORM, &[]).unwrap().body;
        assert!(required.find_block(REQUIRED_PROVIDERS, &[]).unwrap().body.attribute(AWS).is_some());
        assert!(root.find_block(PROVIDER, &[AWS]).is_some());
        assert!(root.find_block(RESOURCE, &[AWS_INSTANCE, "rke2_server2"]).is_some());
        assert!(root.find_block(RESOURCE, &[LOAD_BALANCER, "aws_lb"]).is_some());

        let output = root.find_block(OUTPUT, &["rke2_server1_public_dns"]).unwrap();
        assert_eq!(
            output.body.attribute("value"),
            Some(&Expression::Raw("aws_instance.rke2_server1.public_dns".to_string()))
        );
    }

    #[test]
    fn test_airgap_hosts_have_private_outputs_only() {
        let mut file = HclFile::new();
        AwsResources
            .create_airgap(&mut file, &terraform(), &["bastion", "registry"], &["rke2_server1"])
            .unwrap();

        let root = file.body();
        assert!(root.find_block(OUTPUT, &["bastion_public_dns"]).is_some());
        assert!(root.find_block(OUTPUT, &["rke2_server1_private_ip"]).is_some());
        assert!(root.find_block(OUTPUT, &["rke2_server1_public_dns"]).is_none());
        assert!(root.find_block(RESOURCE, &[LOAD_BALANCER, "aws_internal_lb"]).is_some());
    }

    #[test]
    fn test_harvester_uses_virtual_machines() {
        let mut file = HclFile::new();
        HarvesterResources
            .create_non_airgap(&mut file, &terraform(), &["bastion"])
            .unwrap();

        let root = file.body();
        assert!(root.find_block(RESOURCE, &[HARVESTER_VIRTUAL_MACHINE, "bastion"]).is_some());
        assert!(root.find_block(RESOURCE, &[KUBERNETES_SECRET, "bastionsecret"]).is_some());
        // No servers, no load balancer
        assert!(root.find_block(RESOURCE, &[LOAD_BALANCER, "aws_lb"]).is_none());
    }
}
