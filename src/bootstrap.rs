//! 组装运行时：后台注册循环 + 前台服务

use crate::config::Config;
use crate::registrar::Registrar;
use crate::registry::create_registry;
use crate::runtime::{RuntimeConfig, ServiceRuntime};
use crate::server::foreground_task;
use tracing::info;

/// 按配置构建运行时
///
/// 注册循环与前台服务同时启动，首次注册不等待前台就绪，
/// 除非配置了 `registry.wait_for_ready`。
pub fn build_runtime(config: &Config) -> anyhow::Result<ServiceRuntime> {
    let registry = create_registry(config)?;
    let registrar = Registrar::from_config(config, registry)?;

    info!(
        service_id = %registrar.service_id(),
        registry = %config.registry.url,
        port = config.server.port,
        "Entrypoint configured"
    );

    let runtime = ServiceRuntime::new(config.service.name.clone())
        .with_config(RuntimeConfig::new().with_shutdown_timeout(config.shutdown_timeout()))
        .add_task(Box::new(registrar))
        .add_task(foreground_task(config));

    Ok(runtime)
}

/// 运行直到前台退出或收到关闭信号
pub async fn run(config: Config) -> anyhow::Result<()> {
    build_runtime(&config)?.run().await
}
