use crate::error::Result;
use crate::utils::resolve_host_address;
use async_trait::async_trait;
use std::net::IpAddr;

/// 解析本实例当前的网络地址
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self) -> Result<IpAddr>;
}

/// 通过主机名查询地址（容器内即为容器网络中的 IP）
pub struct HostnameResolver {
    hostname: String,
}

impl HostnameResolver {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

#[async_trait]
impl AddressResolver for HostnameResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        resolve_host_address(&self.hostname).await
    }
}
