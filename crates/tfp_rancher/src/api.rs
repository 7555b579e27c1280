//! The management API surface used by the suites.

use async_trait::async_trait;
use tfp_config::ClusterType;

use crate::error::RancherResult;
use crate::models::Cluster;

/// Operations the suites need from a Rancher management server.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Log in with the local provider and return an API token.
    async fn generate_user_token(&self, username: &str, password: &str) -> RancherResult<String>;

    async fn get_cluster(&self, id: &str) -> RancherResult<Cluster>;

    /// Resolve cluster names to IDs, in the order given.
    async fn find_cluster_ids(&self, names: &[String]) -> RancherResult<Vec<String>>;

    /// The version Rancher provisions when none is requested.
    async fn default_kubernetes_version(&self, cluster_type: ClusterType) -> RancherResult<String>;

    /// Settings applied once after a fresh install: admin password, server
    /// URL and telemetry opt-out.
    async fn post_rancher_install(&self, admin_password: &str) -> RancherResult<()>;
}
