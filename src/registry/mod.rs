//! 服务注册模块
//!
//! 只负责把本实例写入注册中心（upsert）以及关闭时注销，不做服务发现。

pub mod consul;
pub mod trait_def;

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

pub use consul::ConsulRegistry;
pub use trait_def::ServiceRegistry;

/// 根据配置创建注册中心客户端
pub fn create_registry(config: &Config) -> Result<Arc<dyn ServiceRegistry>> {
    let registry = ConsulRegistry::new(
        config.registry.url.clone(),
        config.registry.token.clone(),
        config.request_timeout(),
    )?;
    Ok(Arc::new(registry))
}
