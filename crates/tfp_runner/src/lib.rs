//! # tfp_runner
//!
//! Terraform CLI driver for tfp.
//!
//! # Features
//!
//! - **CLI Runner**: shells out to `terraform` with streamed output and timeouts
//! - **Retries**: re-runs commands whose output matches a known transient error
//! - **Dry-Run Mode**: log commands without executing them
//! - **Mock Runner**: for testing without a Terraform binary
//!
//! # Example
//!
//! ```rust,no_run
//! use tfp_runner::{init_and_apply, CliTerraform, CliTerraformOptions, TerraformOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let terraform = CliTerraform::new(CliTerraformOptions::default())?;
//!     let options = TerraformOptions::new("modules/sanity");
//!
//!     init_and_apply(&terraform, &options).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod mock;
pub mod options;
pub mod runner;
pub mod workflow;

pub use cli::{CliTerraform, CliTerraformOptions, LogHandler, LogLine, LogStream};
pub use error::{TerraformError, TerraformResult};
pub use mock::{CapturedCall, MockResponse, MockTerraform};
pub use options::TerraformOptions;
pub use runner::{CommandResult, Terraform};
pub use workflow::{cleanup, init_and_apply, STATE_FILES};
