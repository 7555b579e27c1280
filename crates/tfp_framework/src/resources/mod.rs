//! Resources for the standalone Rancher environment: hosts, load balancers and
//! the scripts that turn them into a Rancher server.

pub mod instances;
pub mod load_balancer;
pub mod null_resource;
pub mod providers;
pub mod rancher;

use tfp_config::StandaloneConfig;

use crate::error::{FrameworkError, FrameworkResult};

/// Number of servers in the standalone Kubernetes cluster.
pub const SERVER_COUNT: usize = 3;

/// Kubernetes distribution the standalone Rancher runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Rke2,
    K3s,
}

impl Distro {
    /// RKE2 wins when both versions are set.
    pub fn from_standalone(standalone: &StandaloneConfig) -> FrameworkResult<Self> {
        if !standalone.rke2_version.is_empty() {
            Ok(Distro::Rke2)
        } else if !standalone.k3s_version.is_empty() {
            Ok(Distro::K3s)
        } else {
            Err(FrameworkError::Unsupported(
                "standalone.rke2Version or standalone.k3sVersion must be set".to_string(),
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Distro::Rke2 => "rke2",
            Distro::K3s => "k3s",
        }
    }

    pub fn version<'a>(&self, standalone: &'a StandaloneConfig) -> &'a str {
        match self {
            Distro::Rke2 => &standalone.rke2_version,
            Distro::K3s => &standalone.k3s_version,
        }
    }

    /// `rke2_server1`, `rke2_server2`, ...
    pub fn server_names(&self) -> Vec<String> {
        (1..=SERVER_COUNT)
            .map(|i| format!("{}_server{}", self.as_str(), i))
            .collect()
    }
}

/// Addresses of a host created by an earlier apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerNode {
    pub name: String,
    pub public_dns: String,
    pub private_ip: String,
}
