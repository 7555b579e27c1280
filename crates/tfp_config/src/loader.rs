//! Loading and editing the cattle config document.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{RancherConfig, TerraformConfig, TerratestConfig};

/// Environment variable holding the path of the config file.
pub const CONFIG_ENVIRONMENT_KEY: &str = "CATTLE_TEST_CONFIG";

const RANCHER_SECTION: &str = "rancher";
const TERRAFORM_SECTION: &str = "terraform";
const TERRATEST_SECTION: &str = "terratest";

/// The three typed sections of a cattle config.
#[derive(Debug, Clone, Default)]
pub struct TfpConfigs {
    pub rancher: RancherConfig,
    pub terraform: TerraformConfig,
    pub terratest: TerratestConfig,
}

/// Read a YAML config document from disk.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<Value> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    debug!("Loading config from {:?}", path);
    let content = fs::read_to_string(path)?;
    let doc: Value = serde_yaml::from_str(&content)?;
    Ok(doc)
}

/// Read the config document named by `CATTLE_TEST_CONFIG`.
pub fn load_config_from_env() -> ConfigResult<Value> {
    let path = std::env::var(CONFIG_ENVIRONMENT_KEY)
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or(ConfigError::MissingEnv(CONFIG_ENVIRONMENT_KEY))?;
    load_config_from_file(path)
}

/// Convert a config document into its typed sections. Absent sections take
/// their defaults.
pub fn load_tfp_configs(doc: &Value) -> ConfigResult<TfpConfigs> {
    Ok(TfpConfigs {
        rancher: section(doc, RANCHER_SECTION)?,
        terraform: section(doc, TERRAFORM_SECTION)?,
        terratest: section(doc, TERRATEST_SECTION)?,
    })
}

fn section<T: DeserializeOwned + Default>(doc: &Value, key: &str) -> ConfigResult<T> {
    match doc.get(key) {
        Some(value) if !value.is_null() => Ok(serde_yaml::from_value(value.clone())?),
        _ => Ok(T::default()),
    }
}

/// Replace the value at `path`, creating intermediate mappings as needed.
pub fn replace_value<T: Serialize>(path: &[&str], value: T, doc: &mut Value) -> ConfigResult<()> {
    let (last, parents) = path.split_last().ok_or_else(|| ConfigError::InvalidPath {
        path: String::new(),
        message: "path is empty".to_string(),
    })?;

    let new_value = serde_yaml::to_value(value)?;

    let mut current = doc;
    for (depth, key) in parents.iter().enumerate() {
        if current.is_null() {
            *current = Value::Mapping(Mapping::new());
        }
        let mapping = current.as_mapping_mut().ok_or_else(|| ConfigError::InvalidPath {
            path: path.join("."),
            message: format!("{} is not a mapping", path[..depth].join(".")),
        })?;
        current = mapping
            .entry(Value::String(key.to_string()))
            .or_insert(Value::Null);
    }

    if current.is_null() {
        *current = Value::Mapping(Mapping::new());
    }
    let mapping = current.as_mapping_mut().ok_or_else(|| ConfigError::InvalidPath {
        path: path.join("."),
        message: format!("{} is not a mapping", parents.join(".")),
    })?;
    mapping.insert(Value::String(last.to_string()), new_value);

    Ok(())
}

/// Lowercase alphanumeric random suffix.
pub fn random_suffix(len: usize) -> String {
    let mut suffix = String::new();
    while suffix.len() < len {
        suffix.push_str(&uuid::Uuid::new_v4().simple().to_string());
    }
    suffix.truncate(len);
    suffix
}

/// Give every document a unique resource prefix so concurrent runs do not
/// collide on resource names.
pub fn uniquify_terraform(docs: &mut [Value]) -> ConfigResult<()> {
    for doc in docs.iter_mut() {
        let terraform: TerraformConfig = section(doc, TERRAFORM_SECTION)?;
        let suffix = random_suffix(4);

        let prefix = format!("{}-{}", terraform.resource_prefix, suffix);
        replace_value(&[TERRAFORM_SECTION, "resourcePrefix"], &prefix, doc)?;

        if !terraform.cloud_credential_name.is_empty() {
            let name = format!("{}-{}", terraform.cloud_credential_name, suffix);
            replace_value(&[TERRAFORM_SECTION, "cloudCredentialName"], name, doc)?;
        }

        if !terraform.machine_config_name.is_empty() {
            let name = format!("{}-{}", terraform.machine_config_name, suffix);
            replace_value(&[TERRAFORM_SECTION, "machineConfigName"], name, doc)?;
        }

        info!("Using resource prefix {}", prefix);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodepool::{ETCD_NODE_POOL, WORKER_NODE_POOL};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
rancher:
  host: rancher.example.com
  adminPassword: hunter2
  insecure: true
terraform:
  module: ec2_rke2
  providerVersion: "4.2.0"
  resourcePrefix: tfp
  cloudCredentialName: cc
  awsCredentials:
    awsAccessKey: AKIA
    awsSecretKey: secret
terratest:
  kubernetesVersion: v1.30.4+rke2r1
  nodepools:
    - quantity: 1
      etcd: true
      controlplane: true
      worker: true
"#;

    fn sample() -> Value {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let doc = load_config_from_file(file.path()).unwrap();
        let configs = load_tfp_configs(&doc).unwrap();

        assert_eq!(configs.rancher.host, "rancher.example.com");
        assert_eq!(configs.terraform.module, "ec2_rke2");
        assert_eq!(configs.terraform.provider, "aws");
        assert_eq!(configs.terratest.nodepools.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config_from_file("/nonexistent/cattle-config.yaml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_missing_sections_default() {
        let doc: Value = serde_yaml::from_str("rancher:\n  host: h\n").unwrap();
        let configs = load_tfp_configs(&doc).unwrap();
        assert_eq!(configs.terraform.resource_prefix, "tfp");
        assert!(configs.terratest.nodepools.is_empty());
    }

    #[test]
    fn test_replace_value_existing_and_nested() {
        let mut doc = sample();
        replace_value(&["terraform", "module"], "ec2_k3s", &mut doc).unwrap();
        replace_value(&["terraform", "proxy", "proxyBastion"], "10.0.0.9", &mut doc).unwrap();
        replace_value(
            &["terratest", "nodepools"],
            vec![ETCD_NODE_POOL, WORKER_NODE_POOL],
            &mut doc,
        )
        .unwrap();

        let configs = load_tfp_configs(&doc).unwrap();
        assert_eq!(configs.terraform.module, "ec2_k3s");
        assert_eq!(configs.terraform.proxy_bastion(), Some("10.0.0.9"));
        assert_eq!(configs.terratest.nodepools, vec![ETCD_NODE_POOL, WORKER_NODE_POOL]);
    }

    #[test]
    fn test_replace_value_through_scalar_fails() {
        let mut doc = sample();
        let result = replace_value(&["terraform", "module", "name"], "x", &mut doc);
        assert!(matches!(result, Err(ConfigError::InvalidPath { .. })));
    }

    #[test]
    fn test_uniquify_terraform() {
        let mut docs = vec![sample(), sample()];
        uniquify_terraform(&mut docs).unwrap();

        let first = load_tfp_configs(&docs[0]).unwrap().terraform;
        let second = load_tfp_configs(&docs[1]).unwrap().terraform;

        assert!(first.resource_prefix.starts_with("tfp-"));
        assert_eq!(first.resource_prefix.len(), "tfp-".len() + 4);
        assert!(first.cloud_credential_name.starts_with("cc-"));
        assert_ne!(first.resource_prefix, second.resource_prefix);
    }

    #[test]
    fn test_random_suffix() {
        let suffix = random_suffix(40);
        assert_eq!(suffix.len(), 40);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
