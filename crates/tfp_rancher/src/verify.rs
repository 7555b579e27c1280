//! Waiting for provisioned clusters to become active.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::ManagementApi;
use crate::error::{RancherError, RancherResult};

/// How long a cluster may take to go active.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Poll every cluster until it reports `active`.
pub async fn verify_clusters_state<A: ManagementApi + ?Sized>(
    api: &A,
    ids: &[String],
    timeout: Duration,
) -> RancherResult<()> {
    verify_clusters_state_every(api, ids, timeout, DEFAULT_POLL_INTERVAL).await
}

/// [`verify_clusters_state`] with an explicit poll interval.
///
/// The timeout is shared by all clusters. API errors while polling are
/// logged and retried until it runs out.
pub async fn verify_clusters_state_every<A: ManagementApi + ?Sized>(
    api: &A,
    ids: &[String],
    timeout: Duration,
    interval: Duration,
) -> RancherResult<()> {
    let deadline = Instant::now() + timeout;

    for id in ids {
        let mut last_state = String::from("unknown");
        loop {
            match api.get_cluster(id).await {
                Ok(cluster) if cluster.is_active() => {
                    info!("Cluster {} ({}) is active", cluster.name, id);
                    break;
                }
                Ok(cluster) => {
                    debug!("Cluster {} is {}", id, cluster.state);
                    last_state = cluster.state;
                }
                Err(e) => warn!("Failed to get cluster {}: {}", id, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(RancherError::ClusterNotReady {
                    id: id.clone(),
                    state: last_state,
                });
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    Ok(())
}
