//! 周期性自注册
//!
//! 每个周期解析本机地址、构建 [`ServiceRegistration`] 并 upsert 到注册中心。
//! 解析失败或注册失败只记录日志，等待下一个周期重试：无退避、无抖动、无上限。

mod resolver;

pub use resolver::{AddressResolver, HostnameResolver};

use crate::config::Config;
use crate::error::Result;
use crate::registry::ServiceRegistry;
use crate::runtime::task::{Task, TaskResult};
use crate::types::{HealthCheck, HealthCheckProtocol, ServiceRegistration};
use crate::utils::{local_hostname, wait_for_server_ready};
use std::collections::BTreeSet;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 注册循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrarStats {
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
}

/// 注册记录中跨周期不变的部分
#[derive(Debug, Clone)]
pub struct RegistrationTemplate {
    pub id: String,
    pub name: String,
    pub port: u16,
    pub tags: BTreeSet<String>,
    pub check_protocol: HealthCheckProtocol,
    pub check_path: String,
    pub check_interval: Duration,
    pub check_timeout: Duration,
    pub deregister_critical_after: Option<Duration>,
}

impl RegistrationTemplate {
    /// 从配置构建；实例 ID 默认为 `<服务名>-<主机名>`
    pub fn from_config(config: &Config, hostname: &str) -> Self {
        let id = config
            .service
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", config.service.name, hostname));

        Self {
            id,
            name: config.service.name.clone(),
            port: config.server.port,
            tags: config.service.tags.iter().cloned().collect(),
            check_protocol: config.health_check.protocol,
            check_path: config.health_check.path.clone(),
            check_interval: Duration::from_secs(config.health_check.interval_secs),
            check_timeout: Duration::from_secs(config.health_check.timeout_secs),
            deregister_critical_after: config
                .health_check
                .deregister_critical_after_secs
                .map(Duration::from_secs),
        }
    }

    pub fn build(&self, address: IpAddr) -> ServiceRegistration {
        let address = address.to_string();
        let health_check = HealthCheck::for_target(
            self.check_protocol,
            &address,
            self.port,
            &self.check_path,
            self.check_interval,
            self.check_timeout,
        )
        .with_deregister_critical_after(self.deregister_critical_after);

        ServiceRegistration {
            id: self.id.clone(),
            name: self.name.clone(),
            address,
            port: self.port,
            tags: self.tags.clone(),
            health_check,
        }
    }
}

/// 就绪探测地址
///
/// 监听通配地址时探测同族回环地址；主机名一律探测 `127.0.0.1`。
fn ready_probe_address(host: &str, port: u16) -> SocketAddr {
    let ip = match host.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Ok(IpAddr::V6(ip)) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        Ok(ip) => ip,
        Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    SocketAddr::new(ip, port)
}

/// 首次注册前的就绪等待
#[derive(Debug, Clone, Copy)]
struct ReadyGate {
    address: SocketAddr,
    timeout: Duration,
}

pub struct Registrar {
    registry: Arc<dyn ServiceRegistry>,
    resolver: Arc<dyn AddressResolver>,
    template: RegistrationTemplate,
    interval: Duration,
    deregister_on_shutdown: bool,
    ready_gate: Option<ReadyGate>,
    stats: watch::Sender<RegistrarStats>,
}

impl Registrar {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        resolver: Arc<dyn AddressResolver>,
        template: RegistrationTemplate,
        interval: Duration,
    ) -> Self {
        let (stats, _) = watch::channel(RegistrarStats::default());
        Self {
            registry,
            resolver,
            template,
            interval,
            deregister_on_shutdown: true,
            ready_gate: None,
            stats,
        }
    }

    /// 按配置创建；实例身份在启动时确定，之后每个周期保持不变
    pub fn from_config(config: &Config, registry: Arc<dyn ServiceRegistry>) -> Result<Self> {
        let hostname = local_hostname()?;
        let template = RegistrationTemplate::from_config(config, &hostname);
        let resolver = Arc::new(HostnameResolver::new(hostname));

        let mut registrar = Self::new(registry, resolver, template, config.register_interval())
            .with_deregister_on_shutdown(config.registry.deregister_on_shutdown);

        if config.registry.wait_for_ready {
            let probe = ready_probe_address(&config.server.host, config.server.port);
            registrar = registrar.with_ready_gate(
                probe,
                Duration::from_secs(config.registry.ready_timeout_secs),
            );
        }
        Ok(registrar)
    }

    pub fn with_deregister_on_shutdown(mut self, enable: bool) -> Self {
        self.deregister_on_shutdown = enable;
        self
    }

    /// 首次注册前等待 `address` 可连接，最多等待 `timeout`
    pub fn with_ready_gate(mut self, address: SocketAddr, timeout: Duration) -> Self {
        self.ready_gate = Some(ReadyGate { address, timeout });
        self
    }

    pub fn service_id(&self) -> &str {
        &self.template.id
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrarStats> {
        self.stats.subscribe()
    }

    /// 执行一次注册：解析地址、构建记录、upsert
    pub async fn register_once(&self) -> Result<ServiceRegistration> {
        let address = self.resolver.resolve().await?;
        let registration = self.template.build(address);
        self.registry.register(&registration).await?;
        Ok(registration)
    }

    async fn cycle(&self) {
        match self.register_once().await {
            Ok(registration) => {
                let previous_failures = self.stats.borrow().consecutive_failures;
                self.stats.send_modify(|s| {
                    s.cycles += 1;
                    s.successes += 1;
                    s.consecutive_failures = 0;
                });
                if previous_failures > 0 {
                    info!(
                        service_id = %registration.id,
                        failed_cycles = previous_failures,
                        "Registration recovered"
                    );
                } else {
                    debug!(service_id = %registration.id, "Registration cycle succeeded");
                }
            }
            Err(e) => {
                let mut consecutive_failures = 0;
                self.stats.send_modify(|s| {
                    s.cycles += 1;
                    s.failures += 1;
                    s.consecutive_failures += 1;
                    consecutive_failures = s.consecutive_failures;
                });
                warn!(
                    service_id = %self.template.id,
                    error_class = %e.category(),
                    error = %e,
                    consecutive_failures,
                    retry_in = ?self.interval,
                    "Registration cycle failed"
                );
            }
        }
    }

    /// 运行注册循环直到收到关闭信号
    ///
    /// 周期按 tick 计算，与单次请求耗时无关（请求在周期内完成时）。
    pub async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        info!(
            service_id = %self.template.id,
            service_name = %self.template.name,
            port = self.template.port,
            interval = ?self.interval,
            "Registrar loop started"
        );

        if let Some(gate) = self.ready_gate {
            tokio::select! {
                _ = &mut shutdown_rx => return Ok(()),
                ready = wait_for_server_ready(gate.address, gate.timeout) => {
                    if let Err(e) = ready {
                        warn!(error = %e, "Server not ready, registering anyway");
                    }
                }
            }
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = self.cycle() => {}
            }
        }

        info!(service_id = %self.template.id, "Registrar loop stopping");

        let registered = self.stats.borrow().successes > 0;
        if self.deregister_on_shutdown && registered {
            if let Err(e) = self.registry.deregister(&self.template.id).await {
                warn!(
                    service_id = %self.template.id,
                    error = %e,
                    "⚠️ Failed to deregister service on shutdown"
                );
            }
        }
        Ok(())
    }
}

impl Task for Registrar {
    fn name(&self) -> &str {
        "registrar"
    }

    fn run(
        self: Box<Self>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Pin<Box<dyn Future<Output = TaskResult> + Send>> {
        Box::pin(async move { Registrar::run(*self, shutdown_rx).await.map_err(Into::into) })
    }
}
