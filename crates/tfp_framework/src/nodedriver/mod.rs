//! Clusters whose machines are created by Rancher through a node driver.

pub mod rke1;
pub mod rke2k3s;

use tfp_hcl::Body;

use crate::defaults::{
    proxy_url, AGENT_ENV_VARS, HTTPS_PROXY, HTTP_PROXY, NO_PROXY, NO_PROXY_VALUE,
};

/// Route the cluster agents through the squid proxy on the bastion.
pub fn set_proxy_config(cluster: &mut Body, bastion: &str) {
    let url = proxy_url(bastion);
    for (name, value) in [
        (HTTP_PROXY, url.as_str()),
        (HTTPS_PROXY, url.as_str()),
        (NO_PROXY, NO_PROXY_VALUE),
    ] {
        let env = cluster.append_block(AGENT_ENV_VARS, &[]);
        env.set_attribute_value("name", name);
        env.set_attribute_value("value", value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_proxy_config() {
        let mut body = Body::new();
        set_proxy_config(&mut body, "10.0.0.9");

        let env: Vec<_> = body.blocks_of_kind(AGENT_ENV_VARS).collect();
        assert_eq!(env.len(), 3);

        let rendered = tfp_hcl::render::render_body(&body, 0);
        assert!(rendered.contains("name  = \"HTTPS_PROXY\""));
        assert!(rendered.contains("value = \"http://10.0.0.9:3228\""));
        assert!(rendered.contains("cattle-system.svc"));
    }
}
