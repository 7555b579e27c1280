//! `terraform` and `provider` blocks.

use tfp_config::{Module, RancherConfig, TerraformConfig, TfpConfigs};
use tfp_hcl::{Body, HclFile, Value};

use crate::defaults::*;
use crate::error::FrameworkResult;

/// Start a downstream-cluster document: the rancher2 provider, plus the AWS
/// provider when the module creates its own instances.
pub fn set_providers_tf(configs: &TfpConfigs, module: &Module) -> FrameworkResult<HclFile> {
    let terraform = &configs.terraform;
    let mut file = HclFile::new();
    let root = file.body_mut();

    {
        let required = root
            .append_block(TERRAFORM, &[])
            .append_block(REQUIRED_PROVIDERS, &[]);
        rancher2_required_provider(required, terraform);
        if module.uses_node_command() {
            aws_required_provider(required);
        }
    }

    root.append_newline();
    rancher2_provider_block(root, &configs.rancher);

    if module.uses_node_command() {
        root.append_newline();
        aws_provider_block(root, terraform)?;
    }

    Ok(file)
}

pub fn rancher2_required_provider(required: &mut Body, terraform: &TerraformConfig) {
    required.set_attribute_value(
        RANCHER2,
        Value::object([
            (SOURCE, RANCHER2_SOURCE),
            (VERSION, terraform.provider_version.as_str()),
        ]),
    );
}

pub fn rancher2_provider_block(root: &mut Body, rancher: &RancherConfig) {
    let provider = root.append_block(PROVIDER, &[RANCHER2]);
    provider.set_attribute_value("api_url", format!("https://{}", rancher.host));
    provider.set_attribute_value("token_key", rancher.admin_token.as_str());
    provider.set_attribute_value("insecure", rancher.is_insecure());
}

pub fn aws_required_provider(required: &mut Body) {
    let version = provider_version(AWS_PROVIDER_VERSION_ENV);
    required.set_attribute_value(
        AWS,
        Value::object([(SOURCE, AWS_SOURCE), (VERSION, version.as_str())]),
    );
}

pub fn aws_provider_block(root: &mut Body, terraform: &TerraformConfig) -> FrameworkResult<()> {
    let credentials = terraform.require_aws_credentials()?;

    let provider = root.append_block(PROVIDER, &[AWS]);
    provider.set_attribute_value("region", terraform.aws_config.region.as_str());
    provider.set_attribute_value("access_key", credentials.aws_access_key.as_str());
    provider.set_attribute_value("secret_key", credentials.aws_secret_key.as_str());
    Ok(())
}

/// Harvester is reached through its EC2-compatible API, so it reuses the
/// AWS provider source with its own version pin.
pub fn harvester_required_provider(required: &mut Body) {
    let version = provider_version(HARVESTER_PROVIDER_VERSION_ENV);
    required.set_attribute_value(
        AWS,
        Value::object([(SOURCE, AWS_SOURCE), (VERSION, version.as_str())]),
    );
}

pub fn harvester_provider_block(root: &mut Body, terraform: &TerraformConfig) -> FrameworkResult<()> {
    let credentials = terraform.require_harvester_credentials()?;

    let provider = root.append_block(PROVIDER, &[AWS]);
    provider.set_attribute_value("region", terraform.harvester_config.region.as_str());
    provider.set_attribute_value("access_key", credentials.harvester_access_key.as_str());
    provider.set_attribute_value("secret_key", credentials.harvester_secret_key.as_str());
    Ok(())
}

fn provider_version(env_key: &str) -> String {
    std::env::var(env_key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AWS_PROVIDER_VERSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::modules;

    fn configs() -> TfpConfigs {
        let mut configs = TfpConfigs::default();
        configs.rancher.host = "rancher.example.com".to_string();
        configs.rancher.admin_token = "token-abc".to_string();
        configs.rancher.insecure = Some(false);
        configs.terraform.provider_version = "4.1.0".to_string();
        configs.terraform.aws_credentials.aws_access_key = "AKIA".to_string();
        configs.terraform.aws_credentials.aws_secret_key = "secret".to_string();
        configs.terraform.aws_config.region = "us-east-2".to_string();
        configs
    }

    #[test]
    fn test_node_driver_has_only_rancher2() {
        let module = Module::parse(modules::EC2_RKE2).unwrap();
        let file = set_providers_tf(&configs(), &module).unwrap();
        let text = file.to_string();

        assert!(text.contains("source  = \"rancher/rancher2\""));
        assert!(text.contains("version = \"4.1.0\""));
        assert!(text.contains("api_url   = \"https://rancher.example.com\""));
        assert!(text.contains("insecure  = false"));
        assert!(file.body().find_block(PROVIDER, &[AWS]).is_none());
    }

    #[test]
    fn test_custom_module_adds_aws_provider() {
        let module = Module::parse(modules::CUSTOM_EC2_RKE2).unwrap();
        let file = set_providers_tf(&configs(), &module).unwrap();

        let aws = file.body().find_block(PROVIDER, &[AWS]).unwrap();
        assert_eq!(
            aws.body.attribute("region").and_then(|e| e.as_value()),
            Some(&Value::from("us-east-2"))
        );
        assert!(file.to_string().contains("source  = \"hashicorp/aws\""));
    }

    #[test]
    fn test_custom_module_requires_aws_credentials() {
        let module = Module::parse(modules::CUSTOM_EC2_K3S).unwrap();
        let mut configs = configs();
        configs.terraform.aws_credentials.aws_secret_key.clear();

        assert!(set_providers_tf(&configs, &module).is_err());
    }
}
