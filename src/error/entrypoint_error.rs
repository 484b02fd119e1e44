//! 入口程序统一错误类型

use super::code::ErrorCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntrypointError {
    /// 主机名或地址解析失败
    #[error("address resolution failed for {host}: {reason}")]
    AddressResolution { host: String, reason: String },

    /// 注册中心不可达（连接失败、超时等传输层错误）
    #[error("registry unreachable at {url}: {reason}")]
    RegistryUnreachable { url: String, reason: String },

    /// 注册中心返回非 2xx
    #[error("registry rejected request with status {status}: {body}")]
    RegistryRejected { status: u16, body: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 前台服务启动失败或异常退出
    #[error("server error: {0}")]
    Server(String),

    /// 内置应用的存储错误
    #[error("storage error: {0}")]
    Storage(String),
}

impl EntrypointError {
    pub fn address_resolution(host: impl Into<String>, reason: impl ToString) -> Self {
        EntrypointError::AddressResolution {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    pub fn registry_unreachable(url: impl Into<String>, reason: impl ToString) -> Self {
        EntrypointError::RegistryUnreachable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EntrypointError::Config(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        EntrypointError::Server(msg.into())
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            EntrypointError::AddressResolution { .. } => ErrorCategory::AddressResolution,
            EntrypointError::RegistryUnreachable { .. } => ErrorCategory::RegistryUnreachable,
            EntrypointError::RegistryRejected { .. } => ErrorCategory::RegistryRejected,
            EntrypointError::Config(_) => ErrorCategory::Config,
            EntrypointError::Io(_) => ErrorCategory::Io,
            EntrypointError::Server(_) => ErrorCategory::Server,
            EntrypointError::Storage(_) => ErrorCategory::Storage,
        }
    }

    /// 判断是否为注册循环可重试的错误
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, EntrypointError>;
