use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// 一次注册周期发送给注册中心的服务描述
///
/// 每个周期重新构建，发送后即丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: BTreeSet<String>,
    pub health_check: HealthCheck,
}

/// 注册中心探测实例存活的方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub protocol: HealthCheckProtocol,
    /// `http` 时为完整 URL，`tcp` 时为 `host:port`
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    /// 检查持续 critical 超过该时长后由注册中心自动注销
    pub deregister_critical_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckProtocol {
    #[default]
    Http,
    Tcp,
}

impl HealthCheck {
    /// 根据实例地址生成检查描述
    pub fn for_target(
        protocol: HealthCheckProtocol,
        address: &str,
        port: u16,
        path: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        let url = match protocol {
            HealthCheckProtocol::Http => {
                let path = if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{}", path)
                };
                format!("http://{}:{}{}", address, port, path)
            }
            HealthCheckProtocol::Tcp => format!("{}:{}", address, port),
        };

        Self {
            protocol,
            url,
            interval,
            timeout,
            deregister_critical_after: None,
        }
    }

    pub fn with_deregister_critical_after(mut self, after: Option<Duration>) -> Self {
        self.deregister_critical_after = after;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_check_targets_instance_path() {
        let check = HealthCheck::for_target(
            HealthCheckProtocol::Http,
            "10.0.0.7",
            8000,
            "health",
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert_eq!(check.url, "http://10.0.0.7:8000/health");
    }

    #[test]
    fn tcp_check_targets_socket() {
        let check = HealthCheck::for_target(
            HealthCheckProtocol::Tcp,
            "10.0.0.7",
            8000,
            "/",
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert_eq!(check.url, "10.0.0.7:8000");
    }
}
