//! Configuration models.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::nodepool::Nodepool;

/// Connection details for the Rancher management server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RancherConfig {
    pub host: String,
    pub admin_token: String,
    pub admin_password: String,
    pub insecure: Option<bool>,
    pub cleanup: Option<bool>,
}

impl RancherConfig {
    pub fn is_insecure(&self) -> bool {
        self.insecure.unwrap_or(true)
    }

    pub fn should_cleanup(&self) -> bool {
        self.cleanup.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsCredentials {
    pub aws_access_key: String,
    pub aws_secret_key: String,
}

/// EC2 settings shared by node templates, machine configs and instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsConfig {
    pub ami: String,
    pub aws_instance_type: String,
    pub region: String,
    pub aws_security_group_names: Vec<String>,
    pub aws_security_groups: Vec<String>,
    #[serde(rename = "awsSubnetID")]
    pub aws_subnet_id: String,
    #[serde(rename = "awsVpcID")]
    pub aws_vpc_id: String,
    pub aws_zone_letter: String,
    pub aws_root_size: i64,
    pub registry_root_size: i64,
    pub aws_key_name: String,
    pub aws_user: String,
    #[serde(rename = "windowsAMI")]
    pub windows_ami: String,
    pub windows_instance_type: String,
    pub windows_key_name: String,
    #[serde(rename = "windowsAWSUser")]
    pub windows_aws_user: String,
    pub timeout: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinodeCredentials {
    pub linode_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinodeConfig {
    pub linode_image: String,
    pub region: String,
    pub linode_root_pass: String,
    pub linode_instance_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvesterCredentials {
    pub harvester_access_key: String,
    pub harvester_secret_key: String,
}

/// Harvester-hosted standalone infrastructure settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvesterConfig {
    pub ami: String,
    pub region: String,
    pub harvester_instance_type: String,
    #[serde(rename = "harvesterSubnetID")]
    pub harvester_subnet_id: String,
    #[serde(rename = "harvesterVpcID")]
    pub harvester_vpc_id: String,
    pub harvester_security_groups: Vec<String>,
    pub harvester_key_name: String,
    pub harvester_root_size: i64,
    pub registry_root_size: i64,
    pub harvester_user: String,
    #[serde(rename = "windowsAMI")]
    pub windows_ami: String,
    pub windows_instance_type: String,
    pub windows_key_name: String,
    pub windows_harvester_user: String,
    pub timeout: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    pub proxy_bastion: String,
}

/// Settings for the standalone Rancher server the suites stand up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StandaloneConfig {
    pub bootstrap_password: String,
    pub cert_manager_version: String,
    #[serde(rename = "k3sVersion")]
    pub k3s_version: String,
    #[serde(rename = "rke2Version")]
    pub rke2_version: String,
    pub os_user: String,
    pub os_group: String,
    pub rancher_chart_repository: String,
    pub repo: String,
    pub rancher_hostname: String,
    pub rancher_image: String,
    pub rancher_tag_version: String,
    pub rancher_agent_image: String,
    pub upgraded_rancher_chart_repository: String,
    pub upgraded_rancher_repo: String,
    pub upgraded_rancher_tag_version: String,
    pub upgraded_rancher_image: String,
    pub upgraded_rancher_agent_image: String,
    pub upgrade_rancher: bool,
    pub upgrade_proxy_rancher: bool,
    pub upgrade_airgap_rancher: bool,
    #[serde(rename = "airgapInternalFQDN")]
    pub airgap_internal_fqdn: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StandaloneRegistryConfig {
    pub registry_name: String,
    pub registry_username: String,
    pub registry_password: String,
}

/// Terraform generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerraformConfig {
    pub module: String,
    /// Infrastructure provider for the standalone Rancher server.
    pub provider: String,
    pub provider_version: String,
    pub cloud_credential_name: String,
    pub machine_config_name: String,
    pub resource_prefix: String,
    pub private_key_path: String,
    pub windows_private_key_path: String,
    pub enable_network_policy: bool,
    pub default_cluster_role_for_project_members: String,
    pub network_plugin: String,
    pub aws_credentials: AwsCredentials,
    pub aws_config: AwsConfig,
    pub linode_credentials: LinodeCredentials,
    pub linode_config: LinodeConfig,
    pub harvester_credentials: HarvesterCredentials,
    pub harvester_config: HarvesterConfig,
    pub proxy: Option<ProxyConfig>,
    pub standalone: StandaloneConfig,
    pub standalone_registry: StandaloneRegistryConfig,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            module: String::new(),
            provider: "aws".to_string(),
            provider_version: String::new(),
            cloud_credential_name: String::new(),
            machine_config_name: String::new(),
            resource_prefix: "tfp".to_string(),
            private_key_path: String::new(),
            windows_private_key_path: String::new(),
            enable_network_policy: false,
            default_cluster_role_for_project_members: "user".to_string(),
            network_plugin: "canal".to_string(),
            aws_credentials: AwsCredentials::default(),
            aws_config: AwsConfig::default(),
            linode_credentials: LinodeCredentials::default(),
            linode_config: LinodeConfig::default(),
            harvester_credentials: HarvesterCredentials::default(),
            harvester_config: HarvesterConfig::default(),
            proxy: None,
            standalone: StandaloneConfig::default(),
            standalone_registry: StandaloneRegistryConfig::default(),
        }
    }
}

impl TerraformConfig {
    /// Proxy bastion address, if a proxy is configured.
    pub fn proxy_bastion(&self) -> Option<&str> {
        self.proxy
            .as_ref()
            .map(|p| p.proxy_bastion.as_str())
            .filter(|b| !b.is_empty())
    }

    pub fn require_aws_credentials(&self) -> ConfigResult<&AwsCredentials> {
        require("terraform.awsCredentials.awsAccessKey", &self.aws_credentials.aws_access_key)?;
        require("terraform.awsCredentials.awsSecretKey", &self.aws_credentials.aws_secret_key)?;
        Ok(&self.aws_credentials)
    }

    pub fn require_linode_credentials(&self) -> ConfigResult<&LinodeCredentials> {
        require("terraform.linodeCredentials.linodeToken", &self.linode_credentials.linode_token)?;
        Ok(&self.linode_credentials)
    }

    pub fn require_harvester_credentials(&self) -> ConfigResult<&HarvesterCredentials> {
        require(
            "terraform.harvesterCredentials.harvesterAccessKey",
            &self.harvester_credentials.harvester_access_key,
        )?;
        require(
            "terraform.harvesterCredentials.harvesterSecretKey",
            &self.harvester_credentials.harvester_secret_key,
        )?;
        Ok(&self.harvester_credentials)
    }
}

fn require(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    Ok(())
}

/// Settings for the clusters under test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerratestConfig {
    pub nodepools: Vec<Nodepool>,
    pub kubernetes_version: String,
    pub node_count: i64,
    pub windows_node_count: i64,
    pub psact: String,
    pub local_qase_reporting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_aws_credentials() {
        let mut config = TerraformConfig::default();
        let err = config.require_aws_credentials().unwrap_err();
        assert!(err.to_string().contains("awsAccessKey"));

        config.aws_credentials.aws_access_key = "AKIA".to_string();
        let err = config.require_aws_credentials().unwrap_err();
        assert!(err.to_string().contains("awsSecretKey"));

        config.aws_credentials.aws_secret_key = "secret".to_string();
        assert!(config.require_aws_credentials().is_ok());
    }

    #[test]
    fn test_proxy_bastion_empty_is_none() {
        let mut config = TerraformConfig::default();
        assert!(config.proxy_bastion().is_none());

        config.proxy = Some(ProxyConfig::default());
        assert!(config.proxy_bastion().is_none());

        config.proxy = Some(ProxyConfig {
            proxy_bastion: "10.0.0.5".to_string(),
        });
        assert_eq!(config.proxy_bastion(), Some("10.0.0.5"));
    }

    #[test]
    fn test_deserialize_renamed_fields() {
        let yaml = r#"
awsSubnetID: subnet-1
awsVpcID: vpc-1
windowsAMI: ami-win
awsSecurityGroupNames: [open-all]
awsRootSize: 100
"#;
        let config: AwsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.aws_subnet_id, "subnet-1");
        assert_eq!(config.aws_vpc_id, "vpc-1");
        assert_eq!(config.windows_ami, "ami-win");
        assert_eq!(config.aws_security_group_names, vec!["open-all"]);
        assert_eq!(config.aws_root_size, 100);
    }
}
