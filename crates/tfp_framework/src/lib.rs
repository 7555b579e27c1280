//! # tfp_framework
//!
//! Generates the `main.tf` documents for every provisioning scenario.
//!
//! # Architecture
//!
//! - **Downstream clusters**: node-driver, custom and airgap clusters created
//!   through the rancher2 provider ([`set_config_tf`])
//! - **Standalone Rancher**: phased flows that create hosts, bootstrap
//!   Kubernetes and install or upgrade Rancher ([`standalone`])
//! - **Resources**: instances, load balancers and script-driven
//!   `null_resource`s shared by both
//!
//! # Example
//!
//! ```rust,no_run
//! use tfp_config::{load_config_from_env, load_tfp_configs};
//! use tfp_framework::{key_path, set_config_tf, Scenario};
//!
//! let doc = load_config_from_env().unwrap();
//! let configs = load_tfp_configs(&doc).unwrap();
//!
//! let main_tf = set_config_tf(&configs, &key_path(Scenario::Rancher), &[], false).unwrap();
//! println!("{}", std::fs::read_to_string(main_tf).unwrap());
//! ```

pub mod custom;
pub mod defaults;
pub mod error;
pub mod key_path;
pub mod nodedriver;
pub mod providers;
pub mod resources;
pub mod set_config;
pub mod standalone;

pub use error::{FrameworkError, FrameworkResult};
pub use key_path::{key_path, key_path_in, repo_root, Scenario, REPO_ROOT_ENV};
pub use resources::providers::{tunnel_to_provider, AwsResources, HarvesterResources, ProviderResources};
pub use resources::rancher::{RancherRelease, ScriptLibrary};
pub use resources::{Distro, ServerNode};
pub use set_config::{build_main_tf, set_config_tf, MAIN_TF};
pub use standalone::{
    create_airgap_main_tf, create_proxy_main_tf, create_sanity_main_tf, create_upgrade_main_tf, setup,
    StandaloneNodes,
};
