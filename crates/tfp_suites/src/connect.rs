//! Obtaining an authenticated management API client.

use std::sync::Arc;

use async_trait::async_trait;
use tfp_config::RancherConfig;
use tfp_rancher::{ManagementApi, MockManagementApi, RancherClient, ADMIN_USER};
use tracing::debug;

use crate::error::SuiteResult;

/// Produces a management API client for the configured server.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, rancher: &RancherConfig) -> SuiteResult<Arc<dyn ManagementApi>>;
}

/// Logs in as admin when a password is configured, otherwise uses the
/// configured admin token as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RancherConnector;

#[async_trait]
impl Connect for RancherConnector {
    async fn connect(&self, rancher: &RancherConfig) -> SuiteResult<Arc<dyn ManagementApi>> {
        let client = RancherClient::from_config(rancher)?;
        if rancher.admin_password.is_empty() {
            debug!("Using configured admin token for {}", rancher.host);
            return Ok(Arc::new(client));
        }

        let token = client.generate_user_token(ADMIN_USER, &rancher.admin_password).await?;
        Ok(Arc::new(client.with_token(token)))
    }
}

/// The mock shares its state with every client it hands out.
#[async_trait]
impl Connect for MockManagementApi {
    async fn connect(&self, rancher: &RancherConfig) -> SuiteResult<Arc<dyn ManagementApi>> {
        self.generate_user_token(ADMIN_USER, &rancher.admin_password).await?;
        Ok(Arc::new(self.clone()))
    }
}
