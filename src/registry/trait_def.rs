//! 服务注册 Trait 定义

use crate::error::Result;
use crate::types::ServiceRegistration;
use async_trait::async_trait;

/// 服务注册 Trait
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// 注册服务；相同 ID 重复调用覆盖之前的记录
    async fn register(&self, registration: &ServiceRegistration) -> Result<()>;

    /// 注销服务
    async fn deregister(&self, service_id: &str) -> Result<()>;
}
