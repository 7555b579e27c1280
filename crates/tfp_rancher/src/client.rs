//! HTTP implementation of [`ManagementApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tfp_config::{ClusterType, RancherConfig};
use tracing::{debug, info};

use crate::api::ManagementApi;
use crate::error::{RancherError, RancherResult};
use crate::models::{
    default_version_setting, Cluster, Collection, LoginInput, Setting, TokenResponse, User, ADMIN_USER,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the `/v3-public`, `/v3` and `/v1` endpoints of a Rancher
/// server.
pub struct RancherClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl RancherClient {
    /// Create a client for `host`. Certificate checks are skipped when
    /// `insecure` is set, which is the norm for freshly installed servers.
    pub fn new(host: &str, token: impl Into<String>, insecure: bool) -> RancherResult<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url(host),
            token: token.into(),
            client,
        })
    }

    pub fn from_config(config: &RancherConfig) -> RancherResult<Self> {
        Self::new(&config.host, config.admin_token.clone(), config.is_insecure())
    }

    /// Same server, different token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, builder: RequestBuilder) -> RancherResult<T> {
        let response = check(path, builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RancherResult<T> {
        self.send(path, self.request(Method::GET, path)).await
    }

    async fn put_setting(&self, name: &str, value: &str) -> RancherResult<()> {
        let path = format!("/v3/settings/{}", name);
        let builder = self.request(Method::PUT, &path).json(&json!({ "value": value }));
        check(&path, builder.send().await?).await?;
        info!("Set {} to {}", name, value);
        Ok(())
    }

    async fn find_user(&self, username: &str) -> RancherResult<User> {
        let path = "/v3/users";
        let builder = self.request(Method::GET, path).query(&[("username", username)]);
        let users: Collection<User> = self.send(path, builder).await?;
        users
            .data
            .into_iter()
            .next()
            .ok_or_else(|| RancherError::UserNotFound(username.to_string()))
    }
}

#[async_trait]
impl ManagementApi for RancherClient {
    async fn generate_user_token(&self, username: &str, password: &str) -> RancherResult<String> {
        let path = "/v3-public/localProviders/local?action=login";
        let input = LoginInput {
            username,
            password,
            response_type: "json",
        };

        let response = self.request(Method::POST, path).json(&input).send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RancherError::LoginFailed(username.to_string()));
        }
        let token: TokenResponse = check(path, response).await?.json().await?;
        info!("Generated API token for {}", username);
        Ok(token.token)
    }

    async fn get_cluster(&self, id: &str) -> RancherResult<Cluster> {
        self.get(&format!("/v3/clusters/{}", id)).await
    }

    async fn find_cluster_ids(&self, names: &[String]) -> RancherResult<Vec<String>> {
        let path = "/v3/clusters";
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let builder = self.request(Method::GET, path).query(&[("name", name.as_str())]);
            let clusters: Collection<Cluster> = self.send(path, builder).await?;
            let cluster = clusters
                .data
                .into_iter()
                .find(|c| &c.name == name)
                .ok_or_else(|| RancherError::ClusterNotFound(name.clone()))?;
            debug!("Cluster {} has ID {}", name, cluster.id);
            ids.push(cluster.id);
        }
        Ok(ids)
    }

    async fn default_kubernetes_version(&self, cluster_type: ClusterType) -> RancherResult<String> {
        let name = default_version_setting(cluster_type);
        let setting: Setting = self
            .get(&format!("/v1/management.cattle.io.settings/{}", name))
            .await?;

        match setting.effective() {
            "" => Err(RancherError::SettingNotFound(name.to_string())),
            version => Ok(version.to_string()),
        }
    }

    async fn post_rancher_install(&self, admin_password: &str) -> RancherResult<()> {
        let admin = self.find_user(ADMIN_USER).await?;
        let path = format!("/v3/users/{}?action=setpassword", admin.id);
        let builder = self
            .request(Method::POST, &path)
            .json(&json!({ "newPassword": admin_password }));
        check(&path, builder.send().await?).await?;
        info!("Updated password for {}", ADMIN_USER);

        self.put_setting("server-url", &self.base_url).await?;
        self.put_setting("telemetry-opt", "out").await?;
        Ok(())
    }
}

/// Config hosts are bare hostnames; URLs are accepted as given.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check(path: &str, response: Response) -> RancherResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(RancherError::Api {
        status: status.as_u16(),
        path: path.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("rancher.example.com"), "https://rancher.example.com");
        assert_eq!(base_url("http://localhost:8080/"), "http://localhost:8080");
    }

    #[test]
    fn test_from_config() {
        let config = RancherConfig {
            host: "rancher.example.com".to_string(),
            admin_token: "token-abc:secret".to_string(),
            ..Default::default()
        };
        let client = RancherClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://rancher.example.com");
        assert_eq!(client.with_token("other").token, "other");
    }
}
