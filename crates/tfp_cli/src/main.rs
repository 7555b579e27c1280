//! tfp CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or config
//! - 3: Verification failure
//! - 5: Terraform failure

use std::process::ExitCode;

use clap::Parser;
use tfp_config::ConfigError;
use tfp_framework::FrameworkError;
use tfp_rancher::RancherError;
use tfp_runner::TerraformError;
use tfp_suites::SuiteError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_CONFIG: u8 = 2;
    pub const VERIFICATION_FAILURE: u8 = 3;
    pub const TERRAFORM_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(cli.verbose)));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match &cli.command {
        Commands::BuildModule => commands::build_module::execute(&cli).await,
        Commands::Sanity => commands::suites::sanity(&cli).await,
        Commands::Proxy(args) => commands::suites::proxy(&cli, args).await,
        Commands::Upgrade => commands::suites::upgrade(&cli).await,
        Commands::Cleanup(args) => commands::cleanup::execute(&cli, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Log filter used when `RUST_LOG` is unset. Streamed terraform output is
/// logged under the `terraform` target.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "tfp=debug,terraform=debug,info"
    } else {
        "tfp=info,terraform=info,warn"
    }
}

/// Map an error to its exit code by the first typed error in its chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(e) = cause.downcast_ref::<SuiteError>() {
            return match e {
                SuiteError::CasesFailed { .. } | SuiteError::Rancher(_) => ExitCodes::VERIFICATION_FAILURE,
                SuiteError::Config(_) => ExitCodes::INVALID_CONFIG,
                SuiteError::Terraform(_) => ExitCodes::TERRAFORM_ERROR,
                SuiteError::Framework(e) => framework_exit_code(e),
                SuiteError::Setup(_) | SuiteError::Io(_) => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(e) = cause.downcast_ref::<FrameworkError>() {
            return framework_exit_code(e);
        }
        if cause.is::<ConfigError>() {
            return ExitCodes::INVALID_CONFIG;
        }
        if cause.is::<TerraformError>() {
            return ExitCodes::TERRAFORM_ERROR;
        }
        if cause.is::<RancherError>() {
            return ExitCodes::VERIFICATION_FAILURE;
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn framework_exit_code(e: &FrameworkError) -> u8 {
    match e {
        FrameworkError::Config(_) | FrameworkError::Unsupported(_) => ExitCodes::INVALID_CONFIG,
        FrameworkError::Terraform(_) => ExitCodes::TERRAFORM_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_show_terraform_output() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(directives.contains("terraform="), "{}", directives);
            assert!(EnvFilter::try_new(directives).is_ok());
        }
        assert!(default_directives(false).contains("terraform=info"));
    }

    #[test]
    fn test_exit_codes() {
        let failed = anyhow::Error::new(SuiteError::CasesFailed { failed: 1, total: 4 });
        assert_eq!(categorize_error(&failed), ExitCodes::VERIFICATION_FAILURE);

        let terraform = anyhow::Error::new(SuiteError::Framework(FrameworkError::Terraform(
            TerraformError::Timeout(60),
        )));
        assert_eq!(categorize_error(&terraform), ExitCodes::TERRAFORM_ERROR);

        let config = anyhow::Error::new(ConfigError::UnknownModule("gke_rke2".to_string())).context("loading");
        assert_eq!(categorize_error(&config), ExitCodes::INVALID_CONFIG);

        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }
}
