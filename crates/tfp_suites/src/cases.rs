//! The module table every suite iterates.

use tfp_config::{modules, Nodepool, CONTROL_PLANE_NODE_POOL, ETCD_NODE_POOL, WORKER_NODE_POOL};

/// One etcd, one control plane and one worker node.
pub const DEDICATED_ROLES: [Nodepool; 3] = [ETCD_NODE_POOL, CONTROL_PLANE_NODE_POOL, WORKER_NODE_POOL];

/// A provisioning case: which module to generate and with which pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    /// Empty for custom modules that size their own pools.
    pub nodepools: Vec<Nodepool>,
    pub module: &'static str,
}

/// RKE1, RKE2, RKE2 with Windows workers and K3S, each named after `prefix`.
pub fn provisioning_cases(prefix: &str) -> Vec<TestCase> {
    let case = |distro: &str, nodepools: &[Nodepool], module| TestCase {
        name: format!("{} {}", prefix, distro),
        nodepools: nodepools.to_vec(),
        module,
    };

    vec![
        case("RKE1", &DEDICATED_ROLES, modules::EC2_RKE1),
        case("RKE2", &DEDICATED_ROLES, modules::EC2_RKE2),
        case("RKE2 Windows", &[], modules::CUSTOM_EC2_RKE2_WINDOWS),
        case("K3S", &DEDICATED_ROLES, modules::EC2_K3S),
    ]
}

pub fn sanity_cases() -> Vec<TestCase> {
    provisioning_cases("Sanity")
}

pub fn no_proxy_cases() -> Vec<TestCase> {
    provisioning_cases("No Proxy")
}

pub fn proxy_cases() -> Vec<TestCase> {
    provisioning_cases("Proxy")
}

/// Clusters whose nodes have no direct internet access.
pub fn airgap_cases(prefix: &str) -> Vec<TestCase> {
    [
        ("RKE1", modules::AIRGAP_RKE1),
        ("RKE2", modules::AIRGAP_RKE2),
        ("K3S", modules::AIRGAP_K3S),
    ]
    .into_iter()
    .map(|(distro, module)| TestCase {
        name: format!("{} Airgap {}", prefix, distro),
        nodepools: DEDICATED_ROLES.to_vec(),
        module,
    })
    .collect()
}

/// Display name once the Kubernetes version is known.
pub fn case_name(case: &TestCase, kubernetes_version: &str) -> String {
    format!("{} Kubernetes version: {}", case.name, kubernetes_version)
}
