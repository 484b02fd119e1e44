//! 错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误类别
///
/// 前三类是注册循环会吞掉并在下一个周期重试的错误，
/// 其余类别只出现在启动或关闭阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    AddressResolution,
    RegistryUnreachable,
    RegistryRejected,
    Config,
    Io,
    Server,
    Storage,
}

impl ErrorCategory {
    /// 日志字段使用的字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::AddressResolution => "address_resolution",
            ErrorCategory::RegistryUnreachable => "registry_unreachable",
            ErrorCategory::RegistryRejected => "registry_rejected",
            ErrorCategory::Config => "config",
            ErrorCategory::Io => "io",
            ErrorCategory::Server => "server",
            ErrorCategory::Storage => "storage",
        }
    }

    /// 注册循环是否在下一个周期重试此类错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::AddressResolution
                | ErrorCategory::RegistryUnreachable
                | ErrorCategory::RegistryRejected
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_failures_are_retryable() {
        assert!(ErrorCategory::AddressResolution.is_retryable());
        assert!(ErrorCategory::RegistryUnreachable.is_retryable());
        assert!(ErrorCategory::RegistryRejected.is_retryable());
        assert!(!ErrorCategory::Config.is_retryable());
        assert!(!ErrorCategory::Server.is_retryable());
    }

    #[test]
    fn category_serializes_as_log_field() {
        let json = serde_json::to_string(&ErrorCategory::RegistryRejected).unwrap();
        assert_eq!(json, "\"registry_rejected\"");
        assert_eq!(ErrorCategory::RegistryRejected.to_string(), "registry_rejected");
    }
}
