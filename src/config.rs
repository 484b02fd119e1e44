use crate::error::{EntrypointError, Result};
use crate::types::HealthCheckProtocol;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "ENTRYPOINT_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub health_check: HealthCheckConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    /// 不设置时由服务名和主机名派生
    pub id: Option<String>,
    pub tags: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            id: None,
            tags: vec!["api".to_string(), "python".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 前台命令；为空时运行内置应用
    pub command: Vec<String>,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            command: Vec::new(),
            shutdown_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub token: Option<String>,
    pub interval_secs: u64,
    /// 单次注册请求超时；不设置时只受传输层默认超时约束
    pub request_timeout_secs: Option<u64>,
    pub deregister_on_shutdown: bool,
    /// 首次注册前等待服务端口可连接
    pub wait_for_ready: bool,
    pub ready_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "http://consul:8500".to_string(),
            token: None,
            interval_secs: 30,
            request_timeout_secs: None,
            deregister_on_shutdown: true,
            wait_for_ready: false,
            ready_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub protocol: HealthCheckProtocol,
    pub path: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub deregister_critical_after_secs: Option<u64>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            protocol: HealthCheckProtocol::Http,
            path: "/".to_string(),
            interval_secs: 10,
            timeout_secs: 1,
            deregister_critical_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `RUST_LOG` 未设置时使用的过滤指令
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 按 默认值 -> 配置文件 -> 环境变量 的顺序加载
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 用环境变量覆盖配置
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CONSUL_HTTP_ADDR") {
            self.registry.url = normalize_registry_url(&url);
        }
        if let Some(token) = lookup("CONSUL_HTTP_TOKEN").filter(|t| !t.is_empty()) {
            self.registry.token = Some(token);
        }
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(id) = lookup("SERVICE_ID").filter(|id| !id.is_empty()) {
            self.service.id = Some(id);
        }
        if let Some(tags) = lookup("SERVICE_TAGS") {
            self.service.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(host) = lookup("SERVICE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVICE_PORT") {
            self.server.port = parse_env("SERVICE_PORT", &port)?;
        }
        if let Some(secs) = lookup("REGISTER_INTERVAL_SECS") {
            self.registry.interval_secs = parse_env("REGISTER_INTERVAL_SECS", &secs)?;
        }
        if let Some(path) = lookup("HEALTH_CHECK_PATH") {
            self.health_check.path = path;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "pretty" => LogFormat::Text,
                other => {
                    return Err(EntrypointError::config(format!(
                        "LOG_FORMAT must be `text` or `json`, got `{}`",
                        other
                    )));
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(EntrypointError::config("service.name must not be empty"));
        }
        if self.server.port == 0 {
            return Err(EntrypointError::config("server.port must not be 0"));
        }
        if self.registry.interval_secs == 0 {
            return Err(EntrypointError::config(
                "registry.interval_secs must be greater than 0",
            ));
        }
        if self.health_check.interval_secs == 0 || self.health_check.timeout_secs == 0 {
            return Err(EntrypointError::config(
                "health_check interval and timeout must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn register_interval(&self) -> Duration {
        Duration::from_secs(self.registry.interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.registry.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| EntrypointError::config(format!("{}=`{}`: {}", key, value, e)))
}

/// `CONSUL_HTTP_ADDR` 允许省略协议（与 consul CLI 一致）
fn normalize_registry_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_entrypoint_constants() {
        let config = Config::default();
        assert_eq!(config.registry.url, "http://consul:8500");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.register_interval(), Duration::from_secs(30));
        assert!(config.request_timeout().is_none());
        assert!(!config.registry.wait_for_ready);
        config.validate().unwrap();
    }

    #[test]
    fn empty_file_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.service.name, "app");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [service]
            name = "users"
            tags = ["v1"]

            [health_check]
            protocol = "tcp"
            "#,
        )
        .unwrap();
        assert_eq!(config.service.name, "users");
        assert_eq!(config.service.tags, vec!["v1"]);
        assert_eq!(config.health_check.protocol, HealthCheckProtocol::Tcp);
        assert_eq!(config.registry.interval_secs, 30);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("CONSUL_HTTP_ADDR", "127.0.0.1:8500/"),
                ("SERVICE_NAME", "users"),
                ("SERVICE_PORT", "9000"),
                ("SERVICE_TAGS", "a, b,,c"),
                ("REGISTER_INTERVAL_SECS", "5"),
                ("LOG_FORMAT", "JSON"),
            ]))
            .unwrap();
        assert_eq!(config.registry.url, "http://127.0.0.1:8500");
        assert_eq!(config.service.name, "users");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.service.tags, vec!["a", "b", "c"]);
        assert_eq!(config.registry.interval_secs, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn bad_env_value_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("SERVICE_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, EntrypointError::Config(_)));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = Config::default();
        config.registry.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
