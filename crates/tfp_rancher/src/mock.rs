//! Mock management API for testing.
//!
//! Clusters replay a queue of states, one per `get_cluster` call; the last
//! state sticks once the queue is drained.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tfp_config::ClusterType;

use crate::api::ManagementApi;
use crate::error::{RancherError, RancherResult};
use crate::models::Cluster;

#[derive(Debug, Clone)]
struct MockCluster {
    id: String,
    name: String,
    states: VecDeque<String>,
}

/// Mock management API.
#[derive(Clone, Default)]
pub struct MockManagementApi {
    clusters: Arc<RwLock<Vec<MockCluster>>>,
    versions: Arc<RwLock<HashMap<ClusterType, String>>>,
    token: Arc<RwLock<Option<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
    admin_password: Arc<RwLock<Option<String>>>,
    register_on_lookup: Arc<RwLock<bool>>,
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster that reports `states` in order.
    pub fn with_cluster(self, id: &str, name: &str, states: &[&str]) -> Self {
        self.clusters.write().push(MockCluster {
            id: id.to_string(),
            name: name.to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Register a cluster named `name` that is immediately active, with an
    /// ID derived from its position.
    pub fn add_active_cluster(&self, name: &str) -> String {
        let mut clusters = self.clusters.write();
        let id = format!("c-{:05}", clusters.len() + 1);
        clusters.push(MockCluster {
            id: id.clone(),
            name: name.to_string(),
            states: VecDeque::from(vec!["active".to_string()]),
        });
        id
    }

    /// Looking up an unknown name registers it as an active cluster, for
    /// flows that generate their own cluster names.
    pub fn register_on_lookup(self) -> Self {
        *self.register_on_lookup.write() = true;
        self
    }

    pub fn with_default_version(self, cluster_type: ClusterType, version: &str) -> Self {
        self.versions.write().insert(cluster_type, version.to_string());
        self
    }

    /// Token returned by a successful login. Without one, login fails.
    pub fn with_token(self, token: &str) -> Self {
        *self.token.write() = Some(token.to_string());
        self
    }

    /// Calls made, in order, as `method` or `method:argument`.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.split(':').next() == Some(method))
            .count()
    }

    /// Password set by `post_rancher_install`.
    pub fn admin_password(&self) -> Option<String> {
        self.admin_password.read().clone()
    }

    fn record(&self, method: &str, argument: &str) {
        let call = if argument.is_empty() {
            method.to_string()
        } else {
            format!("{}:{}", method, argument)
        };
        self.calls.write().push(call);
    }
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn generate_user_token(&self, username: &str, _password: &str) -> RancherResult<String> {
        self.record("generate_user_token", username);
        self.token
            .read()
            .clone()
            .ok_or_else(|| RancherError::LoginFailed(username.to_string()))
    }

    async fn get_cluster(&self, id: &str) -> RancherResult<Cluster> {
        self.record("get_cluster", id);
        let mut clusters = self.clusters.write();
        let cluster = clusters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RancherError::ClusterNotFound(id.to_string()))?;

        let state = if cluster.states.len() > 1 {
            cluster.states.pop_front().unwrap_or_default()
        } else {
            cluster.states.front().cloned().unwrap_or_default()
        };

        Ok(Cluster {
            id: cluster.id.clone(),
            name: cluster.name.clone(),
            state,
        })
    }

    async fn find_cluster_ids(&self, names: &[String]) -> RancherResult<Vec<String>> {
        self.record("find_cluster_ids", &names.join(","));
        let register = *self.register_on_lookup.read();

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let known = self
                .clusters
                .read()
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.id.clone());
            match known {
                Some(id) => ids.push(id),
                None if register => ids.push(self.add_active_cluster(name)),
                None => return Err(RancherError::ClusterNotFound(name.clone())),
            }
        }
        Ok(ids)
    }

    async fn default_kubernetes_version(&self, cluster_type: ClusterType) -> RancherResult<String> {
        self.record("default_kubernetes_version", cluster_type.as_str());
        self.versions
            .read()
            .get(&cluster_type)
            .cloned()
            .ok_or_else(|| RancherError::SettingNotFound(cluster_type.to_string()))
    }

    async fn post_rancher_install(&self, admin_password: &str) -> RancherResult<()> {
        self.record("post_rancher_install", "");
        *self.admin_password.write() = Some(admin_password.to_string());
        Ok(())
    }
}
