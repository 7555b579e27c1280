//! `locals` holding the registration commands for custom clusters.
//!
//! `rancher2_cluster_v2` only exposes the secure node command, so the
//! insecure variants are derived here with `replace()`.

use tfp_config::{modules, ClusterType, Module, TerraformConfig};
use tfp_hcl::{Body, Value};

use crate::defaults::*;

pub fn set_locals(
    root: &mut Body,
    terraform: &TerraformConfig,
    module: &Module,
    cluster_names: &[String],
) {
    let locals = root.append_block(LOCALS, &[]);
    locals.set_attribute_value(
        ROLE_FLAGS,
        Value::string_list([ETCD_ROLE_FLAG, CONTROL_PLANE_ROLE_FLAG, WORKER_ROLE_FLAG]),
    );

    if module.cluster_type == ClusterType::Rke1 {
        return;
    }

    for name in custom_cluster_names(terraform, cluster_names) {
        set_custom_cluster_locals(locals, &name, terraform, module);
    }
}

/// Custom clusters are named after the resource prefix unless named explicitly.
pub fn custom_cluster_names(terraform: &TerraformConfig, cluster_names: &[String]) -> Vec<String> {
    if cluster_names.is_empty() {
        vec![terraform.resource_prefix.clone()]
    } else {
        cluster_names.to_vec()
    }
}

fn set_custom_cluster_locals(
    locals: &mut Body,
    name: &str,
    terraform: &TerraformConfig,
    module: &Module,
) {
    let token = format!("{}.{}.cluster_registration_token[0]", CLUSTER_V2, name);

    locals.set_attribute_raw(
        format!("{}_{}", name, ORIGINAL_NODE_COMMAND),
        format!("{}.node_command", token),
    );
    locals.set_attribute_raw(
        format!("{}_{}", name, WINDOWS_ORIGINAL_NODE_COMMAND),
        format!("{}.windows_node_command", token),
    );
    locals.set_attribute_raw(
        format!("{}_{}", name, INSECURE_NODE_COMMAND),
        format!(
            r#""${{replace(local.{}_{}, "curl", "curl --insecure")}}""#,
            name, ORIGINAL_NODE_COMMAND
        ),
    );
    locals.set_attribute_raw(
        format!("{}_{}", name, INSECURE_WINDOWS_NODE_COMMAND),
        format!(
            r#""${{replace(local.{}_{}, "curl.exe", "curl.exe --insecure")}}""#,
            name, WINDOWS_ORIGINAL_NODE_COMMAND
        ),
    );

    if module.name == modules::CUSTOM_EC2_RKE2_WINDOWS && terraform.proxy_bastion().is_some() {
        set_proxy_locals(locals, name);
    }
}

/// `set` works under both cmd.exe and PowerShell, `$env:` only under the latter.
fn set_proxy_locals(locals: &mut Body, name: &str) {
    let env_replace = format!(
        r#"replace(local.{}_{}, "$env:", "set ")"#,
        name, WINDOWS_ORIGINAL_NODE_COMMAND
    );
    locals.set_attribute_raw(
        format!("{}_{}", name, INSECURE_WINDOWS_PROXY_NODE_COMMAND),
        format!(r#""${{replace({}, "curl.exe", "curl.exe --insecure")}}""#, env_replace),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_config::ProxyConfig;
    use tfp_hcl::Expression;

    fn locals_of(body: &Body) -> &Body {
        &body.blocks_of_kind(LOCALS).next().unwrap().body
    }

    #[test]
    fn test_rke1_only_has_role_flags() {
        let module = Module::parse(modules::CUSTOM_EC2_RKE1).unwrap();
        let mut root = Body::new();
        set_locals(&mut root, &TerraformConfig::default(), &module, &["c1".to_string()]);

        let locals = locals_of(&root);
        assert_eq!(locals.items().len(), 1);
        assert!(locals.attribute(ROLE_FLAGS).is_some());
    }

    #[test]
    fn test_insecure_commands() {
        let module = Module::parse(modules::CUSTOM_EC2_RKE2).unwrap();
        let mut terraform = TerraformConfig::default();
        terraform.resource_prefix = "tfp-q1".to_string();

        let mut root = Body::new();
        set_locals(&mut root, &terraform, &module, &["tfp-q1".to_string()]);

        let locals = locals_of(&root);
        assert_eq!(locals.items().len(), 5);
        assert_eq!(
            locals.attribute("tfp-q1_original_node_command"),
            Some(&Expression::Raw(
                "rancher2_cluster_v2.tfp-q1.cluster_registration_token[0].node_command".to_string()
            ))
        );
        assert_eq!(
            locals.attribute("tfp-q1_insecure_node_command"),
            Some(&Expression::Raw(
                r#""${replace(local.tfp-q1_original_node_command, "curl", "curl --insecure")}""#
                    .to_string()
            ))
        );
        assert!(locals.attribute("tfp-q1_insecure_windows_proxy_node_command").is_none());
    }

    #[test]
    fn test_named_clusters_replace_prefix() {
        let module = Module::parse(modules::CUSTOM_EC2_K3S).unwrap();
        let mut root = Body::new();
        set_locals(&mut root, &TerraformConfig::default(), &module, &["a".to_string(), "b".to_string()]);

        let locals = locals_of(&root);
        assert_eq!(locals.items().len(), 9);
        assert!(locals.attribute("b_insecure_windows_node_command").is_some());
        assert!(locals.attribute("tfp_original_node_command").is_none());
    }

    #[test]
    fn test_windows_proxy_command() {
        let module = Module::parse(modules::CUSTOM_EC2_RKE2_WINDOWS).unwrap();
        let mut terraform = TerraformConfig::default();
        terraform.proxy = Some(ProxyConfig {
            proxy_bastion: "10.1.1.1".to_string(),
        });

        let mut root = Body::new();
        set_locals(&mut root, &terraform, &module, &[]);

        let command = locals_of(&root)
            .attribute("tfp_insecure_windows_proxy_node_command")
            .and_then(Expression::as_raw)
            .unwrap();
        assert!(command.contains(r#""$env:", "set ""#));
        assert!(command.contains(r#""curl.exe", "curl.exe --insecure""#));
    }
}
