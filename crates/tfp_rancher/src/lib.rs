//! # tfp_rancher
//!
//! Thin client for the Rancher management API, used to log in after a
//! Rancher install and to verify the clusters Terraform provisioned.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfp_rancher::{verify_clusters_state, ManagementApi, RancherClient, DEFAULT_VERIFY_TIMEOUT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RancherClient::new("rancher.example.com", "", true)?;
//!     let token = client.generate_user_token("admin", "password").await?;
//!     let client = client.with_token(token);
//!
//!     let ids = client.find_cluster_ids(&["tfp-c1".to_string()]).await?;
//!     verify_clusters_state(&client, &ids, DEFAULT_VERIFY_TIMEOUT).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod verify;

pub use api::ManagementApi;
pub use client::RancherClient;
pub use error::{RancherError, RancherResult};
pub use mock::MockManagementApi;
pub use models::{Cluster, ACTIVE_STATE, ADMIN_USER};
pub use verify::{verify_clusters_state, verify_clusters_state_every, DEFAULT_POLL_INTERVAL, DEFAULT_VERIFY_TIMEOUT};
