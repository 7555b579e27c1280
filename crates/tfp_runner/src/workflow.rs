//! Init/apply and destroy/cleanup sequences shared by every suite.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::TerraformResult;
use crate::options::TerraformOptions;
use crate::runner::Terraform;

/// Files and directories removed from a module directory after destroy.
pub const STATE_FILES: &[&str] = &[
    "terraform.tfstate",
    "terraform.tfstate.backup",
    ".terraform",
    ".terraform.lock.hcl",
    "main.tf",
];

/// Run `init` followed by `apply`.
pub async fn init_and_apply<T: Terraform + ?Sized>(
    terraform: &T,
    options: &TerraformOptions,
) -> TerraformResult<()> {
    terraform.init(options).await?;
    terraform.apply(options).await?;
    info!("Applied {:?}", options.terraform_dir);
    Ok(())
}

/// Destroy everything in the module directory and remove local state.
///
/// A failed destroy leaves the state in place so the destroy can be retried.
pub async fn cleanup<T: Terraform + ?Sized>(
    terraform: &T,
    options: &TerraformOptions,
) -> TerraformResult<()> {
    info!("Cleaning up {:?}", options.terraform_dir);
    if let Err(e) = terraform.destroy(options).await {
        warn!("terraform destroy failed, keeping state in {:?}: {}", options.terraform_dir, e);
        return Err(e);
    }

    remove_state_files(options.dir())
}

fn remove_state_files(dir: &Path) -> TerraformResult<()> {
    for name in STATE_FILES {
        let path = dir.join(name);
        if path.is_dir() {
            debug!("Removing {:?}", path);
            std::fs::remove_dir_all(&path)?;
        } else if path.exists() {
            debug!("Removing {:?}", path);
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
