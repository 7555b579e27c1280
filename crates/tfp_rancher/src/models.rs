//! Management API payloads.

use serde::{Deserialize, Serialize};
use tfp_config::ClusterType;

/// State reported by a cluster that finished provisioning.
pub const ACTIVE_STATE: &str = "active";

/// Name of the user created by the Rancher install.
pub const ADMIN_USER: &str = "admin";

/// A v3 cluster as returned by `/v3/clusters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub state: String,
}

impl Cluster {
    pub fn is_active(&self) -> bool {
        self.state == ACTIVE_STATE
    }
}

/// A v3 user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// List wrapper used by every v3 collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Login request for the local auth provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub response_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A setting as exposed by `/v1/management.cattle.io.settings`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Setting {
    pub value: String,
    pub default: String,
}

impl Setting {
    /// The configured value, or the built-in default when unset.
    pub fn effective(&self) -> &str {
        if self.value.is_empty() {
            &self.default
        } else {
            &self.value
        }
    }
}

/// Setting that holds the default Kubernetes version for a distribution.
pub fn default_version_setting(cluster_type: ClusterType) -> &'static str {
    match cluster_type {
        ClusterType::Rke1 => "k8s-version",
        ClusterType::Rke2 => "rke2-default-version",
        ClusterType::K3s => "k3s-default-version",
    }
}
