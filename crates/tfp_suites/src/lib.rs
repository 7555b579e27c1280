//! # tfp_suites
//!
//! End-to-end provisioning suites.
//!
//! Each suite stands up a Rancher server with Terraform, then walks the
//! module table: for every case it generates main.tf, applies it, waits for
//! the clusters to go active and destroys them again. The Rancher server is
//! torn down at the end whatever the outcome.
//!
//! - [`SanitySuite`]: plain Rancher install
//! - [`ProxySuite`]: Rancher behind a squid proxy
//! - [`UpgradeSuite`]: clusters before and after a Rancher upgrade
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tfp_config::load_config_from_env;
//! use tfp_framework::repo_root;
//! use tfp_runner::{CliTerraform, CliTerraformOptions};
//! use tfp_suites::{RancherConnector, SanitySuite, SuiteContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let terraform = CliTerraform::new(CliTerraformOptions::default())?;
//!     let ctx = SuiteContext::new(
//!         Arc::new(terraform),
//!         Arc::new(RancherConnector),
//!         load_config_from_env()?,
//!         repo_root(),
//!     );
//!
//!     let report = SanitySuite::new(ctx).run().await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod cases;
pub mod connect;
pub mod context;
pub mod error;
pub mod provision;
pub mod proxy;
pub mod report;
pub mod runner;
pub mod sanity;
pub mod standalone;
pub mod upgrade;

pub use cases::{case_name, TestCase};
pub use connect::{Connect, RancherConnector};
pub use context::SuiteContext;
pub use error::{SuiteError, SuiteResult};
pub use provision::{build_module, cluster_names, select_kubernetes_version, Provisioner};
pub use proxy::ProxySuite;
pub use report::{CaseResult, SuiteReport};
pub use runner::{run_cases, ProxySetting};
pub use sanity::SanitySuite;
pub use standalone::Standalone;
pub use upgrade::UpgradeSuite;
