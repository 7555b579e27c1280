//! Module decision table.
//!
//! A module name such as `ec2_rke2_windows_custom` selects which blocks get
//! generated. Each property is derived from an independent substring match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Well-known module names.
pub mod modules {
    pub const EC2_RKE1: &str = "ec2_rke1";
    pub const EC2_RKE2: &str = "ec2_rke2";
    pub const EC2_K3S: &str = "ec2_k3s";
    pub const LINODE_RKE1: &str = "linode_rke1";
    pub const LINODE_RKE2: &str = "linode_rke2";
    pub const LINODE_K3S: &str = "linode_k3s";
    pub const CUSTOM_EC2_RKE1: &str = "ec2_rke1_custom";
    pub const CUSTOM_EC2_RKE2: &str = "ec2_rke2_custom";
    pub const CUSTOM_EC2_K3S: &str = "ec2_k3s_custom";
    pub const CUSTOM_EC2_RKE2_WINDOWS: &str = "ec2_rke2_windows_custom";
    pub const AIRGAP_RKE1: &str = "airgap_rke1";
    pub const AIRGAP_RKE2: &str = "airgap_rke2";
    pub const AIRGAP_K3S: &str = "airgap_k3s";
}

/// Cloud that hosts downstream cluster nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeProvider {
    AmazonEc2,
    Linode,
}

impl NodeProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeProvider::AmazonEc2 => "ec2",
            NodeProvider::Linode => "linode",
        }
    }
}

impl fmt::Display for NodeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kubernetes distribution of the downstream cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    Rke1,
    Rke2,
    K3s,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterType::Rke1 => "rke1",
            ClusterType::Rke2 => "rke2",
            ClusterType::K3s => "k3s",
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How nodes join the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningMode {
    /// Rancher creates the machines through a node driver.
    NodeDriver,
    /// Instances are created by Terraform and registered with the node command.
    Custom,
    /// Like custom, but nodes have no direct internet access.
    Airgap,
}

/// Parsed module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub provider: NodeProvider,
    pub cluster_type: ClusterType,
    pub mode: ProvisioningMode,
    pub windows: bool,
}

impl Module {
    /// Classify a module name. Unknown providers abort generation.
    pub fn parse(name: &str) -> ConfigResult<Self> {
        let lower = name.to_lowercase();

        let mode = if lower.contains("airgap") {
            ProvisioningMode::Airgap
        } else if lower.contains("custom") {
            ProvisioningMode::Custom
        } else {
            ProvisioningMode::NodeDriver
        };

        let provider = if lower.contains("linode") {
            NodeProvider::Linode
        } else if lower.contains("ec2") || mode == ProvisioningMode::Airgap {
            NodeProvider::AmazonEc2
        } else {
            return Err(ConfigError::UnknownModule(name.to_string()));
        };

        let cluster_type = if lower.contains("rke1") {
            ClusterType::Rke1
        } else if lower.contains("k3s") {
            ClusterType::K3s
        } else if lower.contains("rke2") {
            ClusterType::Rke2
        } else {
            return Err(ConfigError::UnknownModule(name.to_string()));
        };

        Ok(Self {
            name: name.to_string(),
            provider,
            cluster_type,
            mode,
            windows: lower.contains("windows"),
        })
    }

    /// Whether the module provisions a `rancher2_cluster_v2` (RKE2/K3S).
    pub fn is_v2(&self) -> bool {
        self.cluster_type != ClusterType::Rke1
    }

    /// Custom and airgap modules register nodes with the node command.
    pub fn uses_node_command(&self) -> bool {
        matches!(self.mode, ProvisioningMode::Custom | ProvisioningMode::Airgap)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Infrastructure provider hosting the standalone Rancher server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandaloneProvider {
    Aws,
    Harvester,
}

impl StandaloneProvider {
    pub fn parse(name: &str) -> ConfigResult<Self> {
        match name.to_lowercase().as_str() {
            "aws" => Ok(StandaloneProvider::Aws),
            "harvester" => Ok(StandaloneProvider::Harvester),
            _ => Err(ConfigError::ProviderNotFound(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StandaloneProvider::Aws => "aws",
            StandaloneProvider::Harvester => "harvester",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::modules::*;
    use super::*;

    #[test]
    fn test_parse_node_driver_modules() {
        let m = Module::parse(EC2_RKE2).unwrap();
        assert_eq!(m.provider, NodeProvider::AmazonEc2);
        assert_eq!(m.cluster_type, ClusterType::Rke2);
        assert_eq!(m.mode, ProvisioningMode::NodeDriver);
        assert!(!m.windows);
        assert!(m.is_v2());

        let m = Module::parse(LINODE_K3S).unwrap();
        assert_eq!(m.provider, NodeProvider::Linode);
        assert_eq!(m.cluster_type, ClusterType::K3s);

        let m = Module::parse(EC2_RKE1).unwrap();
        assert!(!m.is_v2());
    }

    #[test]
    fn test_parse_custom_and_airgap_modules() {
        let m = Module::parse(CUSTOM_EC2_RKE2_WINDOWS).unwrap();
        assert_eq!(m.mode, ProvisioningMode::Custom);
        assert!(m.windows);
        assert!(m.uses_node_command());

        let m = Module::parse(AIRGAP_K3S).unwrap();
        assert_eq!(m.mode, ProvisioningMode::Airgap);
        assert_eq!(m.provider, NodeProvider::AmazonEc2);
        assert_eq!(m.cluster_type, ClusterType::K3s);
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        assert!(matches!(
            Module::parse("gce_rke2"),
            Err(ConfigError::UnknownModule(_))
        ));
        assert!(matches!(
            Module::parse("ec2_kubeadm"),
            Err(ConfigError::UnknownModule(_))
        ));
    }

    #[test]
    fn test_standalone_provider() {
        assert_eq!(StandaloneProvider::parse("AWS").unwrap(), StandaloneProvider::Aws);
        assert_eq!(
            StandaloneProvider::parse("harvester").unwrap(),
            StandaloneProvider::Harvester
        );
        assert!(matches!(
            StandaloneProvider::parse("linode"),
            Err(ConfigError::ProviderNotFound(_))
        ));
    }
}
