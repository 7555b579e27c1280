//! Integration tests for the phased standalone flows, driven by the mock
//! Terraform driver.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tfp_config::TerraformConfig;
use tfp_framework::{
    create_airgap_main_tf, create_proxy_main_tf, create_sanity_main_tf, create_upgrade_main_tf, ScriptLibrary,
    ServerNode, StandaloneNodes, MAIN_TF,
};
use tfp_runner::{MockTerraform, TerraformOptions};

const SCRIPTS: &[&str] = &[
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
];

struct Workspace {
    dir: TempDir,
    scripts: ScriptLibrary,
    terraform: TerraformConfig,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let scripts_dir = dir.path().join("scripts");
    for name in SCRIPTS {
        let path = scripts_dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "#!/bin/bash\nset -e\n").unwrap();
    }
    let key = dir.path().join("id.pem");
    fs::write(&key, "KEY").unwrap();

    let mut terraform = TerraformConfig::default();
    terraform.private_key_path = key.to_string_lossy().to_string();
    terraform.aws_credentials.aws_access_key = "AKIA".to_string();
    terraform.aws_credentials.aws_secret_key = "SECRET".to_string();
    terraform.standalone.rke2_version = "v1.28.9+rke2r1".to_string();
    terraform.standalone.os_user = "ubuntu".to_string();
    terraform.standalone.rancher_hostname = "rancher.example.com".to_string();

    Workspace {
        scripts: ScriptLibrary::new(&scripts_dir),
        dir,
        terraform,
    }
}

fn with_host_outputs(mock: MockTerraform, hosts: &[&str]) -> MockTerraform {
    hosts.iter().enumerate().fold(mock, |mock, (i, host)| {
        mock.with_output(format!("{}_public_dns", host), format!("{}.example.com", host))
            .with_output(format!("{}_private_ip", host), format!("10.0.0.{}", i + 1))
    })
}

fn applied_documents(mock: &MockTerraform) -> Vec<String> {
    mock.get_calls()
        .into_iter()
        .filter(|c| c.method == "apply")
        .filter_map(|c| c.main_tf)
        .collect()
}

fn options(dir: &Path) -> TerraformOptions {
    TerraformOptions::new(dir.join("modules/sanity"))
}

#[tokio::test]
async fn test_sanity_flow_applies_three_phases() {
    let ws = workspace();
    let mock = with_host_outputs(MockTerraform::new(), &["rke2_server1", "rke2_server2", "rke2_server3"]);
    let options = options(ws.dir.path());

    let nodes = create_sanity_main_tf(&mock, &options, &ws.terraform, &ws.scripts).await.unwrap();

    assert_eq!(nodes.servers.len(), 3);
    assert_eq!(nodes.servers[0].public_dns, "rke2_server1.example.com");
    assert_eq!(mock.call_count("init"), 3);
    assert_eq!(mock.call_count("output"), 6);

    let documents = applied_documents(&mock);
    assert_eq!(documents.len(), 3);
    assert!(documents[0].contains(r#"resource "aws_instance" "rke2_server3" {"#));
    assert!(!documents[0].contains("null_resource"));
    assert!(documents[1].contains(r#"resource "null_resource" "rke2_server2" {"#));
    assert!(!documents[1].contains("install_rancher"));
    assert!(documents[2].contains(r#"resource "null_resource" "install_rancher" {"#));

    // Each phase extends the previous document
    assert!(documents[2].starts_with(documents[1].trim_end()));
    assert!(options.main_tf().exists());
}

#[tokio::test]
async fn test_missing_output_fails_the_flow() {
    let ws = workspace();
    let mock = MockTerraform::new();

    let err = create_sanity_main_tf(&mock, &options(ws.dir.path()), &ws.terraform, &ws.scripts)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("rke2_server1_public_dns"));
    assert_eq!(mock.call_count("apply"), 1);
}

#[tokio::test]
async fn test_proxy_flow_installs_squid_on_bastion() {
    let ws = workspace();
    let mock = with_host_outputs(
        MockTerraform::new(),
        &["bastion", "rke2_server1", "rke2_server2", "rke2_server3"],
    );

    let nodes = create_proxy_main_tf(&mock, &options(ws.dir.path()), &ws.terraform, &ws.scripts)
        .await
        .unwrap();

    assert_eq!(nodes.bastion.as_ref().unwrap().private_ip, "10.0.0.1");
    let documents = applied_documents(&mock);
    assert!(documents[1].contains(r#"resource "null_resource" "install_squid_proxy" {"#));
    assert!(documents[1].contains("10.0.0.2 10.0.0.3 10.0.0.4 || true"));
    assert!(documents[2].contains(r#"resource "null_resource" "install_proxy_rancher" {"#));
}

#[tokio::test]
async fn test_airgap_flow_goes_through_bastion() {
    let ws = workspace();
    let mock = with_host_outputs(
        MockTerraform::new(),
        &["bastion", "registry", "rke2_server1", "rke2_server2", "rke2_server3"],
    );

    let nodes = create_airgap_main_tf(&mock, &options(ws.dir.path()), &ws.terraform, &ws.scripts)
        .await
        .unwrap();

    assert!(nodes.servers.iter().all(|s| s.public_dns.is_empty()));
    let documents = applied_documents(&mock);
    assert_eq!(documents.len(), 4);
    assert!(documents[0].contains("associate_public_ip_address = false"));
    assert!(documents[1].contains(r#"resource "null_resource" "non_auth_registry" {"#));
    assert!(documents[2].contains(r#"bastion_host        = "bastion.example.com""#));
    assert!(documents[3].contains(r#"resource "null_resource" "install_airgap_rancher" {"#));
}

#[tokio::test]
async fn test_upgrade_selects_proxy_over_plain() {
    let ws = workspace();
    let mut terraform = ws.terraform.clone();
    terraform.standalone.upgrade_rancher = true;
    terraform.standalone.upgrade_proxy_rancher = true;

    let nodes = StandaloneNodes {
        servers: vec![ServerNode {
            name: "rke2_server1".to_string(),
            public_dns: "server.example.com".to_string(),
            private_ip: "10.0.0.2".to_string(),
        }],
        bastion: Some(ServerNode {
            name: "bastion".to_string(),
            public_dns: "bastion.example.com".to_string(),
            private_ip: "10.0.0.1".to_string(),
        }),
        registry: None,
    };

    let mock = MockTerraform::new();
    let options = TerraformOptions::new(ws.dir.path().join("modules/upgrade"));
    let upgraded = create_upgrade_main_tf(&mock, &options, &terraform, &ws.scripts, &nodes)
        .await
        .unwrap();

    assert!(upgraded);
    let main_tf = fs::read_to_string(options.dir().join(MAIN_TF)).unwrap();
    assert!(main_tf.contains(r#"resource "null_resource" "upgrade_proxy_rancher" {"#));
    assert!(!main_tf.contains(r#""upgrade_rancher""#));
    assert!(!main_tf.contains("rancher2"));
}

#[tokio::test]
async fn test_upgrade_without_flags_does_nothing() {
    let ws = workspace();
    let mock = MockTerraform::new();
    let options = TerraformOptions::new(ws.dir.path().join("modules/upgrade"));

    let upgraded = create_upgrade_main_tf(&mock, &options, &ws.terraform, &ws.scripts, &StandaloneNodes::default())
        .await
        .unwrap();

    assert!(!upgraded);
    assert_eq!(mock.call_count("apply"), 0);
}
