//! Cluster state polling against the mock API.

use std::time::Duration;

use tfp_rancher::{verify_clusters_state, verify_clusters_state_every, MockManagementApi, RancherError};

const TICK: Duration = Duration::from_millis(1);

#[tokio::test]
async fn test_waits_until_active() {
    let api = MockManagementApi::new()
        .with_cluster("c-1", "tfp-c1", &["provisioning", "updating", "active"])
        .with_cluster("c-2", "tfp-c2", &["active"]);

    let ids = vec!["c-1".to_string(), "c-2".to_string()];
    verify_clusters_state_every(&api, &ids, Duration::from_secs(5), TICK)
        .await
        .unwrap();

    assert_eq!(api.call_count("get_cluster"), 4);
}

#[tokio::test]
async fn test_times_out_with_last_state() {
    let api = MockManagementApi::new().with_cluster("c-1", "tfp-c1", &["error"]);

    let err = verify_clusters_state_every(&api, &["c-1".to_string()], Duration::from_millis(20), TICK)
        .await
        .unwrap_err();

    match err {
        RancherError::ClusterNotReady { id, state } => {
            assert_eq!(id, "c-1");
            assert_eq!(state, "error");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unknown_cluster_is_not_ready() {
    let api = MockManagementApi::new();

    let err = verify_clusters_state(&api, &["c-missing".to_string()], Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, RancherError::ClusterNotReady { ref state, .. } if state == "unknown"));
}

#[tokio::test]
async fn test_no_clusters_is_ok() {
    let api = MockManagementApi::new();
    verify_clusters_state(&api, &[], Duration::ZERO).await.unwrap();
    assert!(api.get_calls().is_empty());
}
