//! Instance blocks for linux, Windows and airgapped hosts.

use tfp_config::TerraformConfig;
use tfp_hcl::{list_of_strings, Body, Value};

use crate::defaults::*;

/// Instance settings common to the EC2 and Harvester backends.
#[derive(Debug, Clone)]
pub struct InstanceSettings {
    /// Resource type for linux hosts with a public address
    pub resource_type: &'static str,
    /// Emit a `kubernetes_secret` companion before each linux host
    pub with_secret: bool,
    pub ami: String,
    pub instance_type: String,
    pub subnet_id: String,
    pub security_groups: Vec<String>,
    pub key_name: String,
    pub root_size: i64,
    pub registry_root_size: i64,
    pub user: String,
    pub windows_ami: String,
    pub windows_instance_type: String,
    pub windows_key_name: String,
    pub windows_user: String,
    pub timeout: String,
    pub resource_prefix: String,
    pub private_key_path: String,
    pub windows_private_key_path: String,
}

impl InstanceSettings {
    pub fn aws(terraform: &TerraformConfig) -> Self {
        let aws = &terraform.aws_config;
        Self {
            resource_type: AWS_INSTANCE,
            with_secret: false,
            ami: aws.ami.clone(),
            instance_type: aws.aws_instance_type.clone(),
            subnet_id: aws.aws_subnet_id.clone(),
            security_groups: aws.aws_security_groups.clone(),
            key_name: aws.aws_key_name.clone(),
            root_size: aws.aws_root_size,
            registry_root_size: aws.registry_root_size,
            user: aws.aws_user.clone(),
            windows_ami: aws.windows_ami.clone(),
            windows_instance_type: aws.windows_instance_type.clone(),
            windows_key_name: aws.windows_key_name.clone(),
            windows_user: aws.windows_aws_user.clone(),
            timeout: aws.timeout.clone(),
            resource_prefix: terraform.resource_prefix.clone(),
            private_key_path: terraform.private_key_path.clone(),
            windows_private_key_path: terraform.windows_private_key_path.clone(),
        }
    }

    pub fn harvester(terraform: &TerraformConfig) -> Self {
        let harvester = &terraform.harvester_config;
        Self {
            resource_type: HARVESTER_VIRTUAL_MACHINE,
            with_secret: true,
            ami: harvester.ami.clone(),
            instance_type: harvester.harvester_instance_type.clone(),
            subnet_id: harvester.harvester_subnet_id.clone(),
            security_groups: harvester.harvester_security_groups.clone(),
            key_name: harvester.harvester_key_name.clone(),
            root_size: harvester.harvester_root_size,
            registry_root_size: harvester.registry_root_size,
            user: harvester.harvester_user.clone(),
            windows_ami: harvester.windows_ami.clone(),
            windows_instance_type: harvester.windows_instance_type.clone(),
            windows_key_name: harvester.windows_key_name.clone(),
            windows_user: harvester.windows_harvester_user.clone(),
            timeout: harvester.timeout.clone(),
            resource_prefix: terraform.resource_prefix.clone(),
            private_key_path: terraform.private_key_path.clone(),
            windows_private_key_path: terraform.windows_private_key_path.clone(),
        }
    }
}

/// Linux host reachable on its public address. `count` is set for custom
/// cluster nodes, whose names then carry the count index.
pub fn create_instances(
    root: &mut Body,
    settings: &InstanceSettings,
    count: Option<i64>,
    hostname: &str,
) {
    if settings.with_secret {
        let secret_name = format!("{}secret", hostname);
        let secret = root.append_block(RESOURCE, &[KUBERNETES_SECRET, &secret_name]);
        secret.set_attribute_value("name", secret_name.as_str());
        secret.set_attribute_value("namespace", "default");
        root.append_newline();
    }

    let instance = root.append_block(RESOURCE, &[settings.resource_type, hostname]);
    if let Some(count) = count {
        instance.set_attribute_value("count", count);
    }

    let root_size = if hostname.contains("registry") {
        settings.registry_root_size
    } else {
        settings.root_size
    };
    set_machine(instance, settings, &settings.ami, &settings.instance_type, &settings.key_name, root_size);

    let name = match count {
        Some(_) => format!("\"{}-{}-${{count.index}}\"", settings.resource_prefix, hostname),
        None => format!("\"{}-{}\"", settings.resource_prefix, hostname),
    };
    set_name_tag(instance, name);

    set_connection(instance, &settings.user, "self.public_ip", &settings.private_key_path, &settings.timeout, false);
    instance.append_newline();
    set_connected_check(instance);
}

/// Linux host without a public address; reached through a bastion.
pub fn create_airgapped_instances(root: &mut Body, settings: &InstanceSettings, hostname: &str) {
    let instance = root.append_block(RESOURCE, &[AWS_INSTANCE, hostname]);
    instance.set_attribute_value("associate_public_ip_address", false);
    set_machine(
        instance,
        settings,
        &settings.ami,
        &settings.instance_type,
        &settings.key_name,
        settings.root_size,
    );
    set_name_tag(instance, format!("\"{}-{}\"", settings.resource_prefix, hostname));
    set_connection(instance, &settings.user, "self.private_ip", &settings.private_key_path, &settings.timeout, false);
}

/// Windows hosts for custom clusters, named `<hostname>-windows`.
pub fn create_windows_instances(
    root: &mut Body,
    settings: &InstanceSettings,
    windows_node_count: i64,
    hostname: &str,
) {
    let resource_name = format!("{}-windows", hostname);
    let instance = root.append_block(RESOURCE, &[AWS_INSTANCE, &resource_name]);
    instance.set_attribute_value("count", windows_node_count);
    set_machine(
        instance,
        settings,
        &settings.windows_ami,
        &settings.windows_instance_type,
        &settings.windows_key_name,
        settings.root_size,
    );
    set_name_tag(
        instance,
        format!("\"{}-windows-${{count.index}}\"", settings.resource_prefix),
    );
    set_connection(
        instance,
        &settings.windows_user,
        "self.public_ip",
        &settings.windows_private_key_path,
        &settings.timeout,
        true,
    );
    instance.append_newline();
    set_connected_check(instance);
}

fn set_machine(
    instance: &mut Body,
    settings: &InstanceSettings,
    ami: &str,
    instance_type: &str,
    key_name: &str,
    root_size: i64,
) {
    instance.set_attribute_value("ami", ami);
    instance.set_attribute_value("instance_type", instance_type);
    instance.set_attribute_value("subnet_id", settings.subnet_id.as_str());
    instance.set_attribute_raw("vpc_security_group_ids", list_of_strings(&settings.security_groups));
    instance.set_attribute_value("key_name", key_name);
    instance.append_newline();

    instance
        .append_block(ROOT_BLOCK_DEVICE, &[])
        .set_attribute_value("volume_size", root_size);
    instance.append_newline();
}

fn set_name_tag(instance: &mut Body, name_expression: String) {
    instance
        .set_attribute_object("tags")
        .set_attribute_raw("Name", name_expression);
    instance.append_newline();
}

fn set_connection(
    instance: &mut Body,
    user: &str,
    host: &str,
    private_key_path: &str,
    timeout: &str,
    windows: bool,
) {
    let connection = instance.append_block(CONNECTION, &[]);
    connection.set_attribute_value("type", "ssh");
    connection.set_attribute_value("user", user);
    connection.set_attribute_raw("host", host);
    if windows {
        connection.set_attribute_value("target_platform", "windows");
    }
    connection.set_attribute_raw("private_key", file_expression(private_key_path));
    connection.set_attribute_value("timeout", timeout);
}

fn set_connected_check(instance: &mut Body) {
    instance
        .append_block(PROVISIONER, &[REMOTE_EXEC])
        .set_attribute_value(INLINE, Value::string_list(["echo Connected!!!"]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_hcl::Expression;

    fn settings() -> InstanceSettings {
        let mut terraform = TerraformConfig::default();
        terraform.aws_config.ami = "ami-linux".to_string();
        terraform.aws_config.windows_ami = "ami-windows".to_string();
        terraform.aws_config.aws_security_groups = vec!["sg-1".to_string()];
        terraform.aws_config.aws_root_size = 80;
        terraform.aws_config.registry_root_size = 500;
        terraform.aws_config.aws_user = "ubuntu".to_string();
        terraform.aws_config.windows_aws_user = "Administrator".to_string();
        terraform.private_key_path = "/keys/id.pem".to_string();
        InstanceSettings::aws(&terraform)
    }

    fn root_size(body: &Body, labels: &[&str]) -> Option<Expression> {
        let instance = body.find_block(RESOURCE, labels)?;
        let device = instance.body.blocks_of_kind(ROOT_BLOCK_DEVICE).next()?;
        device.body.attribute("volume_size").cloned()
    }

    #[test]
    fn test_standalone_instance() {
        let mut root = Body::new();
        create_instances(&mut root, &settings(), None, "rke2_server1");

        let text = tfp_hcl::render::render_body(&root, 0);
        assert!(text.contains("resource \"aws_instance\" \"rke2_server1\" {"));
        assert!(text.contains("Name = \"tfp-rke2_server1\""));
        assert!(text.contains("private_key = file(\"/keys/id.pem\")"));
        assert!(text.contains("host        = self.public_ip"));
        assert!(text.contains("inline = [\"echo Connected!!!\"]"));
        assert!(!text.contains("count"));
    }

    #[test]
    fn test_custom_instance_is_counted() {
        let mut root = Body::new();
        create_instances(&mut root, &settings(), Some(3), "tfp_pool0");

        let instance = root.find_block(RESOURCE, &[AWS_INSTANCE, "tfp_pool0"]).unwrap();
        assert_eq!(
            instance.body.attribute("count"),
            Some(&Expression::Value(3i64.into()))
        );

        let text = tfp_hcl::render::render_body(&root, 0);
        assert!(text.contains("Name = \"tfp-tfp_pool0-${count.index}\""));
    }

    #[test]
    fn test_registry_uses_registry_root_size() {
        let mut root = Body::new();
        create_instances(&mut root, &settings(), None, "registry");
        create_instances(&mut root, &settings(), None, "rke2_server1");

        assert_eq!(
            root_size(&root, &[AWS_INSTANCE, "registry"]),
            Some(Expression::Value(500.into()))
        );
        assert_eq!(
            root_size(&root, &[AWS_INSTANCE, "rke2_server1"]),
            Some(Expression::Value(80.into()))
        );
    }

    #[test]
    fn test_harvester_adds_secret() {
        let mut terraform = TerraformConfig::default();
        terraform.harvester_config.harvester_root_size = 40;
        let settings = InstanceSettings::harvester(&terraform);

        let mut root = Body::new();
        create_instances(&mut root, &settings, None, "rke2_server1");

        assert!(root
            .find_block(RESOURCE, &[KUBERNETES_SECRET, "rke2_server1secret"])
            .is_some());
        assert!(root
            .find_block(RESOURCE, &[HARVESTER_VIRTUAL_MACHINE, "rke2_server1"])
            .is_some());
    }

    #[test]
    fn test_airgapped_instances_use_private_ip() {
        let mut root = Body::new();
        create_airgapped_instances(&mut root, &settings(), "rke2_server1");

        let text = tfp_hcl::render::render_body(&root, 0);
        assert!(text.contains("associate_public_ip_address = false"));
        assert!(text.contains("self.private_ip"));
        assert!(!text.contains("self.public_ip"));
        assert!(!text.contains("remote-exec"));
    }

    #[test]
    fn test_windows_instances() {
        let mut root = Body::new();
        create_windows_instances(&mut root, &settings(), 2, "tfp");

        let instance = root.find_block(RESOURCE, &[AWS_INSTANCE, "tfp-windows"]).unwrap();
        assert_eq!(
            instance.body.attribute("ami"),
            Some(&Expression::Value("ami-windows".into()))
        );
        assert_eq!(
            instance.body.attribute("count"),
            Some(&Expression::Value(2i64.into()))
        );
    }
}
