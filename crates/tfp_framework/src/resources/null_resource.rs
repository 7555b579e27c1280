//! `null_resource` blocks that run commands on an existing host.

use tfp_config::TerraformConfig;
use tfp_hcl::Body;

use crate::defaults::*;

/// Where a connection points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host<'a> {
    /// An address known when the document is generated.
    Address(&'a str),
    /// A Terraform expression such as `aws_instance.node[count.index].public_ip`.
    Expression(&'a str),
}

/// SSH connection settings for a provisioner.
#[derive(Debug, Clone, Copy)]
pub struct Connection<'a> {
    pub user: &'a str,
    pub private_key_path: &'a str,
    pub host: Host<'a>,
    pub bastion: Option<&'a str>,
    pub windows: bool,
}

impl<'a> Connection<'a> {
    /// Standalone hosts log in as the configured OS user.
    pub fn standalone(terraform: &'a TerraformConfig, host: Host<'a>) -> Self {
        Self {
            user: &terraform.standalone.os_user,
            private_key_path: &terraform.private_key_path,
            host,
            bastion: None,
            windows: false,
        }
    }

    pub fn via_bastion(mut self, bastion: &'a str) -> Self {
        self.bastion = Some(bastion);
        self
    }
}

/// Append a `null_resource` connected to `host` and return the body of its
/// `remote-exec` provisioner.
pub fn create_null_resource<'a>(
    root: &'a mut Body,
    terraform: &TerraformConfig,
    host: &str,
    name: &str,
) -> &'a mut Body {
    create_null_resource_with(root, name, None, &Connection::standalone(terraform, Host::Address(host)))
}

/// Like [`create_null_resource`], for hosts only reachable through `bastion`.
pub fn create_airgapped_null_resource<'a>(
    root: &'a mut Body,
    terraform: &TerraformConfig,
    host: &str,
    bastion: &str,
    name: &str,
) -> &'a mut Body {
    let connection = Connection::standalone(terraform, Host::Address(host)).via_bastion(bastion);
    create_null_resource_with(root, name, None, &connection)
}

/// General form: optional `count`, arbitrary connection.
pub fn create_null_resource_with<'a>(
    root: &'a mut Body,
    name: &str,
    count: Option<i64>,
    connection: &Connection<'_>,
) -> &'a mut Body {
    let resource = root.append_block(RESOURCE, &[NULL_RESOURCE, name]);
    if let Some(count) = count {
        resource.set_attribute_value("count", count);
        resource.append_newline();
    }
    set_connection(resource, connection);
    resource.append_newline();
    resource.append_block(PROVISIONER, &[REMOTE_EXEC])
}

fn set_connection(resource: &mut Body, connection: &Connection<'_>) {
    let key = file_expression(connection.private_key_path);

    let block = resource.append_block(CONNECTION, &[]);
    block.set_attribute_value("type", "ssh");
    block.set_attribute_value("user", connection.user);
    match connection.host {
        Host::Address(address) => block.set_attribute_value("host", address),
        Host::Expression(expression) => block.set_attribute_raw("host", expression),
    }
    block.set_attribute_raw("private_key", key.as_str());
    if connection.windows {
        block.set_attribute_value("target_platform", "windows");
    }

    if let Some(bastion) = connection.bastion {
        block.set_attribute_value("bastion_host", bastion);
        block.set_attribute_value("bastion_user", connection.user);
        block.set_attribute_raw("bastion_private_key", key);
    }
}
