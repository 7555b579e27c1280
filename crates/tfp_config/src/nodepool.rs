//! Node pool topology.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A node pool: how many machines and which roles they carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nodepool {
    pub quantity: i64,
    pub etcd: bool,
    pub controlplane: bool,
    pub worker: bool,
}

pub const ETCD_NODE_POOL: Nodepool = Nodepool {
    quantity: 1,
    etcd: true,
    controlplane: false,
    worker: false,
};

pub const CONTROL_PLANE_NODE_POOL: Nodepool = Nodepool {
    quantity: 1,
    etcd: false,
    controlplane: true,
    worker: false,
};

pub const WORKER_NODE_POOL: Nodepool = Nodepool {
    quantity: 1,
    etcd: false,
    controlplane: false,
    worker: true,
};

pub const ALL_IN_ONE_NODE_POOL: Nodepool = Nodepool {
    quantity: 1,
    etcd: true,
    controlplane: true,
    worker: true,
};

impl Nodepool {
    /// Registration flags for the roles this pool carries, in etcd,
    /// control plane, worker order.
    pub fn role_flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.etcd {
            flags.push("--etcd");
        }
        if self.controlplane {
            flags.push("--controlplane");
        }
        if self.worker {
            flags.push("--worker");
        }
        flags
    }

    pub fn has_role(&self) -> bool {
        self.etcd || self.controlplane || self.worker
    }
}

/// Reject pools that cannot produce a working node.
pub fn validate_nodepool(pool: &Nodepool, pool_num: usize) -> ConfigResult<()> {
    if pool.quantity <= 0 {
        return Err(ConfigError::InvalidNodepool {
            pool: format!("pool{}", pool_num),
            message: format!("quantity must be at least 1, got {}", pool.quantity),
        });
    }

    if !pool.has_role() {
        return Err(ConfigError::InvalidNodepool {
            pool: format!("pool{}", pool_num),
            message: "at least one of etcd, controlplane or worker must be set".to_string(),
        });
    }

    Ok(())
}
