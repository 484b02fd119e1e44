//! Consul 服务注册实现

use super::trait_def::ServiceRegistry;
use crate::error::{EntrypointError, Result};
use crate::types::{HealthCheckProtocol, ServiceRegistration};
use crate::utils::format_go_duration;
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul agent HTTP API 客户端
pub struct ConsulRegistry {
    client: reqwest::Client,
    base_url: String,
    endpoint: Url,
    token: Option<String>,
}

#[allow(non_snake_case)]
#[derive(Debug, Serialize)]
pub(crate) struct ConsulService {
    ID: String,
    Name: String,
    Tags: Vec<String>,
    Address: String,
    Port: u16,
    Check: ConsulCheck,
}

#[allow(non_snake_case)]
#[derive(Debug, Serialize)]
struct ConsulCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    HTTP: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    TCP: Option<String>,
    Interval: String,
    Timeout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    DeregisterCriticalServiceAfter: Option<String>,
}

impl From<&ServiceRegistration> for ConsulService {
    fn from(reg: &ServiceRegistration) -> Self {
        let check = &reg.health_check;
        let (http, tcp) = match check.protocol {
            HealthCheckProtocol::Http => (Some(check.url.clone()), None),
            HealthCheckProtocol::Tcp => (None, Some(check.url.clone())),
        };

        ConsulService {
            ID: reg.id.clone(),
            Name: reg.name.clone(),
            Tags: reg.tags.iter().cloned().collect(),
            Address: reg.address.clone(),
            Port: reg.port,
            Check: ConsulCheck {
                HTTP: http,
                TCP: tcp,
                Interval: format_go_duration(check.interval),
                Timeout: format_go_duration(check.timeout),
                DeregisterCriticalServiceAfter: check
                    .deregister_critical_after
                    .map(format_go_duration),
            },
        }
    }
}

impl ConsulRegistry {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(EntrypointError::config("No Consul endpoint provided"));
        }
        let endpoint = Url::parse(&base_url).map_err(|e| {
            EntrypointError::config(format!("Invalid Consul endpoint `{}`: {}", base_url, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(EntrypointError::config(format!(
                "Invalid Consul endpoint `{}`",
                base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| EntrypointError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            endpoint,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 在 endpoint 路径后追加各段；每段单独做百分号编码
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn put(&self, url: Url, body: Option<&ConsulService>) -> Result<()> {
        let mut request = self.client.put(url.clone());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EntrypointError::registry_unreachable(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EntrypointError::RegistryRejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<()> {
        let url = self.api_url(&["v1", "agent", "service", "register"]);
        let payload = ConsulService::from(registration);
        debug!(url = %url, payload = ?payload, "Sending Consul registration");

        self.put(url, Some(&payload)).await?;

        info!(
            service_id = %registration.id,
            address = %registration.address,
            port = registration.port,
            "Service registered with Consul"
        );
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<()> {
        let url = self.api_url(&["v1", "agent", "service", "deregister", service_id]);
        self.put(url, None).await?;

        info!(service_id = %service_id, "Service deregistered from Consul");
        Ok(())
    }
}
