//! Network load balancers in front of the standalone Rancher servers.

use tfp_hcl::{list_of_strings, traversal, Body};

use crate::defaults::*;

const EXTERNAL_LB: &str = "aws_lb";
const INTERNAL_LB: &str = "aws_internal_lb";

/// Target groups, the external load balancer, listeners and attachments for
/// every port in [`LOAD_BALANCER_PORTS`].
pub fn create_load_balancer(root: &mut Body, resource_prefix: &str, subnet_id: &str, vpc_id: &str) {
    for &port in LOAD_BALANCER_PORTS {
        create_target_group(root, resource_prefix, vpc_id, TARGET_GROUP_PREFIX, port);
    }

    create_lb(root, EXTERNAL_LB, &format!("{}-lb", resource_prefix), subnet_id, false);

    for &port in LOAD_BALANCER_PORTS {
        create_listener(root, EXTERNAL_LB, TARGET_GROUP_PREFIX, port);
        create_target_group_attachments(root, TARGET_GROUP_PREFIX, port);
    }
}

/// Internal load balancer used by airgapped nodes to reach Rancher.
pub fn create_internal_load_balancer(root: &mut Body, resource_prefix: &str, subnet_id: &str, vpc_id: &str) {
    for &port in INTERNAL_LOAD_BALANCER_PORTS {
        create_target_group(root, resource_prefix, vpc_id, TARGET_GROUP_INTERNAL_PREFIX, port);
    }

    create_lb(root, INTERNAL_LB, &format!("{}-internal-lb", resource_prefix), subnet_id, true);

    for &port in INTERNAL_LOAD_BALANCER_PORTS {
        create_listener(root, INTERNAL_LB, TARGET_GROUP_INTERNAL_PREFIX, port);
        create_target_group_attachments(root, TARGET_GROUP_INTERNAL_PREFIX, port);
    }
}

fn create_target_group(root: &mut Body, resource_prefix: &str, vpc_id: &str, prefix: &str, port: u16) {
    let name = format!("{}{}", prefix, port);
    let group = root.append_block(RESOURCE, &[LOAD_BALANCER_TARGET_GROUP, &name]);
    group.set_attribute_value("name", format!("{}-{}", resource_prefix, name.replace('_', "-")));
    group.set_attribute_value("port", port);
    group.set_attribute_value("protocol", "TCP");
    group.set_attribute_value("target_type", "instance");
    group.set_attribute_value("vpc_id", vpc_id);
    group.append_newline();

    let health = group.append_block("health_check", &[]);
    health.set_attribute_value("protocol", "HTTP");
    health.set_attribute_value("port", "traffic-port");
    health.set_attribute_value("path", "/ping");
    health.set_attribute_value("interval", 10i64);
    health.set_attribute_value("timeout", 6i64);
    health.set_attribute_value("healthy_threshold", 3i64);
    health.set_attribute_value("unhealthy_threshold", 3i64);
    health.set_attribute_value("matcher", "200-399");
    root.append_newline();
}

fn create_lb(root: &mut Body, label: &str, name: &str, subnet_id: &str, internal: bool) {
    let lb = root.append_block(RESOURCE, &[LOAD_BALANCER, label]);
    lb.set_attribute_value("internal", internal);
    lb.set_attribute_value("load_balancer_type", "network");
    lb.set_attribute_raw("subnets", list_of_strings(&[subnet_id]));
    lb.set_attribute_value("name", name);
    root.append_newline();
}

fn create_listener(root: &mut Body, lb_label: &str, prefix: &str, port: u16) {
    let label = format!("{}listener_{}", prefix.trim_end_matches("tg_"), port);
    let listener = root.append_block(RESOURCE, &[LOAD_BALANCER_LISTENER, &label]);
    listener.set_attribute_raw("load_balancer_arn", traversal(&[LOAD_BALANCER, lb_label, "arn"]));
    listener.set_attribute_value("port", port);
    listener.set_attribute_value("protocol", "TCP");

    let target_group = format!("{}{}", prefix, port);
    let action = listener.append_block("default_action", &[]);
    action.set_attribute_value("type", "forward");
    action.set_attribute_raw(
        "target_group_arn",
        traversal(&[LOAD_BALANCER_TARGET_GROUP, &target_group, "arn"]),
    );
    root.append_newline();
}

/// Attach every server in `local.rke2_instance_ids` to the port's target group.
pub fn create_target_group_attachments(root: &mut Body, prefix: &str, port: u16) {
    let label = format!("attach_{}{}", prefix, port);
    let target_group = format!("{}{}", prefix, port);

    let attachment = root.append_block(RESOURCE, &[LOAD_BALANCER_TARGET_GROUP_ATTACHMENT, &label]);
    attachment.set_attribute_raw("for_each", traversal(&["local", RKE2_INSTANCE_IDS]));
    attachment.set_attribute_raw(
        "target_group_arn",
        traversal(&[LOAD_BALANCER_TARGET_GROUP, &target_group, "arn"]),
    );
    attachment.set_attribute_raw("target_id", "each.value");
    attachment.set_attribute_value("port", port);
    root.append_newline();
}

/// `locals { rke2_instance_ids = { ... } }` keyed by server name.
pub fn create_instance_ids_local(root: &mut Body, resource_type: &str, servers: &[&str]) {
    let ids = root
        .append_block(LOCALS, &[])
        .set_attribute_object(RKE2_INSTANCE_IDS);
    for server in servers {
        ids.set_attribute_raw(*server, traversal(&[resource_type, server, "id"]));
    }
    root.append_newline();
}
