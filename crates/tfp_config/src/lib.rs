//! # tfp_config
//!
//! Typed configuration for the tfp provisioning harness.
//!
//! Configuration lives in a single YAML document (the "cattle config") with
//! three top-level sections:
//!
//! - `rancher` - management server address and credentials
//! - `terraform` - module selection, cloud credentials and standalone settings
//! - `terratest` - node pools and Kubernetes version under test
//!
//! The document can be edited as untyped YAML before it is converted into the
//! typed structs, which is how test scenarios select a module per case.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfp_config::{load_config_from_file, load_tfp_configs, replace_value, Module};
//!
//! let mut doc = load_config_from_file("cattle-config.yaml").unwrap();
//! replace_value(&["terraform", "module"], "ec2_rke2", &mut doc).unwrap();
//!
//! let configs = load_tfp_configs(&doc).unwrap();
//! let module = Module::parse(&configs.terraform.module).unwrap();
//! assert!(module.is_v2());
//! ```

pub mod error;
pub mod loader;
pub mod models;
pub mod module;
pub mod nodepool;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    load_config_from_env, load_config_from_file, load_tfp_configs, random_suffix, replace_value,
    uniquify_terraform, TfpConfigs, CONFIG_ENVIRONMENT_KEY,
};
pub use models::*;
pub use module::{modules, ClusterType, Module, NodeProvider, ProvisioningMode, StandaloneProvider};
pub use nodepool::{
    validate_nodepool, Nodepool, ALL_IN_ONE_NODE_POOL, CONTROL_PLANE_NODE_POOL, ETCD_NODE_POOL,
    WORKER_NODE_POOL,
};
