//! Script-driven `null_resource`s that install and upgrade the standalone
//! Rancher server and its supporting hosts.
//!
//! Every resource copies a script from the script library onto the host,
//! then runs it with positional arguments. Scripts end in `|| true` so a
//! failing helm hook does not leave the resource tainted; the suites verify
//! the result through the Rancher API instead.

use std::fs;
use std::path::{Path, PathBuf};

use tfp_config::{StandaloneConfig, TerraformConfig};
use tfp_hcl::{Body, Value};
use tracing::debug;

use super::null_resource::{create_airgapped_null_resource, create_null_resource};
use super::{Distro, ServerNode};
use crate::defaults::{INLINE, NULL_RESOURCE, RESOURCE};
use crate::error::{FrameworkError, FrameworkResult};

/// Directory holding the host scripts, relative to the repository root.
pub const SCRIPTS_DIR: &str = "scripts";

/// Shell scripts copied onto hosts.
#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    root: PathBuf,
}

impl ScriptLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_repo_root(repo_root: impl AsRef<Path>) -> Self {
        Self::new(repo_root.as_ref().join(SCRIPTS_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a script by its path inside the library, e.g. `squid/setup.sh`.
    pub fn read(&self, name: &str) -> FrameworkResult<String> {
        let path = self.root.join(name);
        debug!("Reading script {:?}", path);
        fs::read_to_string(&path).map_err(|source| FrameworkError::ReadFile { path, source })
    }
}

/// A Rancher chart release: the one installed first, or the one upgraded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RancherRelease {
    pub chart_repository: String,
    pub repo: String,
    pub tag_version: String,
    pub image: String,
    pub agent_image: Option<String>,
}

impl RancherRelease {
    pub fn initial(standalone: &StandaloneConfig) -> Self {
        Self {
            chart_repository: standalone.rancher_chart_repository.clone(),
            repo: standalone.repo.clone(),
            tag_version: standalone.rancher_tag_version.clone(),
            image: standalone.rancher_image.clone(),
            agent_image: non_empty(&standalone.rancher_agent_image),
        }
    }

    pub fn upgraded(standalone: &StandaloneConfig) -> Self {
        Self {
            chart_repository: standalone.upgraded_rancher_chart_repository.clone(),
            repo: standalone.upgraded_rancher_repo.clone(),
            tag_version: standalone.upgraded_rancher_tag_version.clone(),
            image: standalone.upgraded_rancher_image.clone(),
            agent_image: non_empty(&standalone.upgraded_rancher_agent_image),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Install Rancher with helm on the first server.
pub fn create_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    server_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::initial(standalone);
    let script = scripts.read("sanity/setup.sh")?;

    let command = run_script(
        "/tmp/setup.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.cert_manager_version,
            &standalone.rancher_hostname,
            &release.tag_version,
            &standalone.bootstrap_password,
            &release.image,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, server_public_dns, "install_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/setup.sh"),
            "chmod +x /tmp/setup.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Upgrade Rancher in place to the configured upgrade release.
pub fn upgrade_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    server_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::upgraded(standalone);
    let script = scripts.read("sanity/upgrade.sh")?;

    let command = run_script(
        "/tmp/upgrade.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.rancher_hostname,
            &release.tag_version,
            &release.image,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, server_public_dns, "upgrade_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/upgrade.sh"),
            "chmod +x /tmp/upgrade.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Install Rancher configured to reach the internet through the squid proxy.
pub fn create_proxied_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    proxy_private_ip: &str,
    server_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::initial(standalone);
    let script = scripts.read("proxy/setup.sh")?;

    let command = run_script(
        "/tmp/setup.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.cert_manager_version,
            &standalone.rancher_hostname,
            &release.tag_version,
            &standalone.bootstrap_password,
            &release.image,
            proxy_private_ip,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, server_public_dns, "install_proxy_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/setup.sh"),
            "chmod +x /tmp/setup.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

pub fn upgrade_proxied_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    proxy_private_ip: &str,
    server_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::upgraded(standalone);
    let script = scripts.read("proxy/upgrade.sh")?;

    let command = run_script(
        "/tmp/upgrade.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.rancher_hostname,
            &release.tag_version,
            &release.image,
            proxy_private_ip,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, server_public_dns, "upgrade_proxy_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/upgrade.sh"),
            "chmod +x /tmp/upgrade.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Install squid on the bastion. The bastion also receives the private key
/// so it can reach the servers.
pub fn create_squid_proxy(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    bastion_public_dns: &str,
    server_private_ips: &[&str],
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let registry = &terraform.standalone_registry;
    let script = scripts.read("squid/setup.sh")?;
    let squid_conf = scripts.read("squid/squid.conf")?;
    let key_path = PathBuf::from(&terraform.private_key_path);
    let private_key = fs::read_to_string(&key_path).map_err(|source| FrameworkError::ReadFile {
        path: key_path.clone(),
        source,
    })?;

    let mut args: Vec<&str> = vec![
        &standalone.os_user,
        &standalone.os_group,
        bastion_public_dns,
        &standalone.bootstrap_password,
        &registry.registry_username,
        &registry.registry_password,
        &registry.registry_name,
        &standalone.rke2_version,
    ];
    args.extend_from_slice(server_private_ips);
    let command = run_script("/tmp/setup.sh", &args, None);

    create_null_resource(root, terraform, bastion_public_dns, "install_squid_proxy").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/setup.sh"),
            write_file(&squid_conf, "/tmp/squid.conf"),
            write_file(&private_key, "/tmp/keyfile.pem"),
            "chmod +x /tmp/setup.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Run a registry without authentication and mirror the release images.
pub fn create_non_auth_registry(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    release: &RancherRelease,
    registry_public_dns: &str,
    name: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let script = scripts.read("registry/non-auth-registry.sh")?;

    let command = run_script(
        "/tmp/registry.sh",
        &[
            &standalone.os_user,
            registry_public_dns,
            &release.tag_version,
            &release.image,
            distro_version(standalone),
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, registry_public_dns, name).set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/registry.sh"),
            "chmod +x /tmp/registry.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Install Rancher from the private registry, driven from the bastion.
pub fn create_airgap_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    registry_public_dns: &str,
    bastion_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::initial(standalone);
    let script = scripts.read("airgap/setup.sh")?;

    let command = run_script(
        "/tmp/setup.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.cert_manager_version,
            &standalone.rancher_hostname,
            &release.tag_version,
            &standalone.bootstrap_password,
            &release.image,
            registry_public_dns,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, bastion_public_dns, "install_airgap_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/setup.sh"),
            "chmod +x /tmp/setup.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

pub fn upgrade_airgap_rancher(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    registry_public_dns: &str,
    bastion_public_dns: &str,
) -> FrameworkResult<()> {
    let standalone = &terraform.standalone;
    let release = RancherRelease::upgraded(standalone);
    let script = scripts.read("airgap/upgrade.sh")?;

    let command = run_script(
        "/tmp/upgrade.sh",
        &[
            &release.chart_repository,
            &release.repo,
            &standalone.rancher_hostname,
            &release.tag_version,
            &release.image,
            registry_public_dns,
        ],
        release.agent_image.as_deref(),
    );

    create_null_resource(root, terraform, bastion_public_dns, "upgrade_airgap_rancher").set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&script, "/tmp/upgrade.sh"),
            "chmod +x /tmp/upgrade.sh".to_string(),
            command,
        ]),
    );
    Ok(())
}

/// Bootstrap the standalone Kubernetes cluster: the first server initializes,
/// the rest join it. Airgapped servers are reached through `bastion` and pull
/// from `registry`.
pub fn create_servers(
    root: &mut Body,
    terraform: &TerraformConfig,
    scripts: &ScriptLibrary,
    distro: Distro,
    servers: &[ServerNode],
    registry: Option<&str>,
    bastion: Option<&str>,
) -> FrameworkResult<()> {
    let Some((first, rest)) = servers.split_first() else {
        return Err(FrameworkError::Unsupported("at least one server is required".to_string()));
    };

    let standalone = &terraform.standalone;
    let version = distro.version(standalone);
    let token = standalone.bootstrap_password.as_str();
    let init_script = scripts.read(&format!("{}/init-server.sh", distro.as_str()))?;
    let add_script = scripts.read(&format!("{}/add-server.sh", distro.as_str()))?;

    let first_name = first.name.clone();
    let provisioner = server_null_resource(root, terraform, first, bastion);
    provisioner.set_attribute_value(
        INLINE,
        Value::string_list([
            write_file(&init_script, "/tmp/init-server.sh"),
            "chmod +x /tmp/init-server.sh".to_string(),
            run_script(
                "/tmp/init-server.sh",
                &[version, &first.private_ip, token],
                registry,
            ),
        ]),
    );

    for server in rest {
        let provisioner = server_null_resource(root, terraform, server, bastion);
        provisioner.set_attribute_value(
            INLINE,
            Value::string_list([
                write_file(&add_script, "/tmp/add-server.sh"),
                "chmod +x /tmp/add-server.sh".to_string(),
                run_script(
                    "/tmp/add-server.sh",
                    &[version, &first.private_ip, token],
                    registry,
                ),
            ]),
        );
        set_depends_on(root, &server.name, &first_name);
    }

    Ok(())
}

fn server_null_resource<'a>(
    root: &'a mut Body,
    terraform: &TerraformConfig,
    server: &ServerNode,
    bastion: Option<&str>,
) -> &'a mut Body {
    match bastion {
        Some(bastion) => {
            create_airgapped_null_resource(root, terraform, &server.private_ip, bastion, &server.name)
        }
        None => create_null_resource(root, terraform, &server.public_dns, &server.name),
    }
}

fn set_depends_on(root: &mut Body, resource: &str, depends_on: &str) {
    if let Some(block) = root.find_block_mut(RESOURCE, &[NULL_RESOURCE, resource]) {
        block
            .body
            .set_attribute_raw("depends_on", format!("[{}.{}]", NULL_RESOURCE, depends_on));
    }
}

fn distro_version(standalone: &StandaloneConfig) -> &str {
    if standalone.rke2_version.is_empty() {
        &standalone.k3s_version
    } else {
        &standalone.rke2_version
    }
}

/// `printf` the content into `path`, single quotes escaped for the shell.
fn write_file(content: &str, path: &str) -> String {
    format!("printf '%s\\n' '{}' > {}", content.replace('\'', r"'\''"), path)
}

/// `bash -c '<script> <args> [optional] || true'`. Empty arguments stay in
/// place so positions do not shift.
fn run_script(script: &str, args: &[&str], optional: Option<&str>) -> String {
    let mut inner = script.to_string();
    for arg in args.iter().chain(optional.iter()) {
        inner.push(' ');
        inner.push_str(&quote_arg(arg));
    }
    inner.push_str(" || true");
    format!("bash -c '{}'", inner.replace('\'', r"'\''"))
}

/// Double-quote an argument for the inner bash unless it is a plain word.
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.:/+=,@%".contains(c));
    if plain {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tfp_hcl::Expression;

    fn library() -> (TempDir, ScriptLibrary) {
        let dir = TempDir::new().unwrap();
        for name in [
            "sanity/setup.sh",
            "sanity/upgrade.sh",
            "proxy/setup.sh",
            "proxy/upgrade.sh",
            "squid/setup.sh",
            "squid/squid.conf",
            "registry/non-auth-registry.sh",
            "airgap/setup.sh",
            "airgap/upgrade.sh",
            "rke2/init-server.sh",
            "rke2/add-server.sh",
        ] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("#!/bin/bash\necho {}\n", name)).unwrap();
        }
        let library = ScriptLibrary::new(dir.path());
        (dir, library)
    }

    fn terraform() -> TerraformConfig {
        let mut terraform = TerraformConfig::default();
        let standalone = &mut terraform.standalone;
        standalone.rancher_chart_repository = "https://releases.rancher.com/server-charts/".to_string();
        standalone.repo = "latest".to_string();
        standalone.cert_manager_version = "v1.13.1".to_string();
        standalone.rancher_hostname = "rancher.example.com".to_string();
        standalone.rancher_tag_version = "v2.8.3".to_string();
        standalone.bootstrap_password = "bootstrap".to_string();
        standalone.rancher_image = "rancher/rancher".to_string();
        standalone.upgraded_rancher_tag_version = "v2.9.0".to_string();
        standalone.rke2_version = "v1.28.9+rke2r1".to_string();
        standalone.os_user = "ubuntu".to_string();
        terraform
    }

    fn inline(root: &Body, name: &str) -> Vec<String> {
        let resource = root.find_block("resource", &[NULL_RESOURCE, name]).unwrap();
        let provisioner = resource.body.find_block("provisioner", &["remote-exec"]).unwrap();
        match provisioner.body.attribute(INLINE) {
            Some(Expression::Value(Value::List(items))) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => panic!("unexpected value {:?}", other),
                })
                .collect(),
            other => panic!("unexpected inline {:?}", other),
        }
    }

    #[test]
    fn test_create_rancher_command() {
        let (_dir, scripts) = library();
        let mut root = Body::new();
        create_rancher(&mut root, &terraform(), &scripts, "server.example").unwrap();

        let commands = inline(&root, "install_rancher");
        assert_eq!(commands.len(), 3);
        assert!(commands[0].starts_with("printf '%s\\n' '#!/bin/bash"));
        assert!(commands[0].ends_with("' > /tmp/setup.sh"));
        assert_eq!(
            commands[2],
            "bash -c '/tmp/setup.sh https://releases.rancher.com/server-charts/ latest v1.13.1 \
             rancher.example.com v2.8.3 bootstrap rancher/rancher || true'"
        );
    }

    #[test]
    fn test_agent_image_appends_argument() {
        let (_dir, scripts) = library();
        let mut terraform = terraform();
        terraform.standalone.upgraded_rancher_agent_image = "rancher/rancher-agent".to_string();

        let mut root = Body::new();
        upgrade_rancher(&mut root, &terraform, &scripts, "server.example").unwrap();

        let commands = inline(&root, "upgrade_rancher");
        assert!(commands[2].ends_with("v2.9.0 \"\" rancher/rancher-agent || true'"));
    }

    #[test]
    fn test_script_arguments_are_quoted() {
        assert_eq!(
            run_script("/tmp/setup.sh", &["v1.28.9+rke2r1", "", "it's a $secret"], None),
            r#"bash -c '/tmp/setup.sh v1.28.9+rke2r1 "" "it'\''s a \$secret" || true'"#
        );
        assert_eq!(
            run_script("/tmp/setup.sh", &["a"], Some("rancher/rancher-agent")),
            "bash -c '/tmp/setup.sh a rancher/rancher-agent || true'"
        );
    }

    #[test]
    fn test_missing_script() {
        let dir = TempDir::new().unwrap();
        let scripts = ScriptLibrary::new(dir.path());
        let err = create_rancher(&mut Body::new(), &terraform(), &scripts, "server").unwrap_err();
        assert!(matches!(err, FrameworkError::ReadFile { .. }));
    }

    #[test]
    fn test_squid_copies_private_key() {
        let (dir, scripts) = library();
        let key = dir.path().join("id.pem");
        fs::write(&key, "-----BEGIN KEY-----").unwrap();
        let mut terraform = terraform();
        terraform.private_key_path = key.to_string_lossy().to_string();

        let mut root = Body::new();
        create_squid_proxy(&mut root, &terraform, &scripts, "bastion.example", &["10.0.0.1", "10.0.0.2", "10.0.0.3"])
            .unwrap();

        let commands = inline(&root, "install_squid_proxy");
        assert_eq!(commands.len(), 5);
        assert!(commands[2].contains("BEGIN KEY"));
        assert!(commands[4].ends_with("10.0.0.1 10.0.0.2 10.0.0.3 || true'"));
    }

    #[test]
    fn test_create_servers_join_first() {
        let (_dir, scripts) = library();
        let servers: Vec<ServerNode> = (1..=3)
            .map(|i| ServerNode {
                name: format!("rke2_server{}", i),
                public_dns: format!("server{}.example", i),
                private_ip: format!("10.0.0.{}", i),
            })
            .collect();

        let mut root = Body::new();
        create_servers(&mut root, &terraform(), &scripts, Distro::Rke2, &servers, None, None).unwrap();

        let first = inline(&root, "rke2_server1");
        assert_eq!(
            first[2],
            "bash -c '/tmp/init-server.sh v1.28.9+rke2r1 10.0.0.1 bootstrap || true'"
        );

        let third = root.find_block("resource", &[NULL_RESOURCE, "rke2_server3"]).unwrap();
        assert_eq!(
            third.body.attribute("depends_on"),
            Some(&Expression::Raw("[null_resource.rke2_server1]".to_string()))
        );
        assert!(inline(&root, "rke2_server2")[2].starts_with("bash -c '/tmp/add-server.sh"));
    }

    #[test]
    fn test_write_file_escapes_single_quotes() {
        assert_eq!(write_file("it's", "/tmp/x"), r"printf '%s\n' 'it'\''s' > /tmp/x");
    }
}
