//! 运行时配置模块

use std::time::Duration;

/// 运行时配置
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// 关闭超时时间（默认 5 秒）
    pub shutdown_timeout: Duration,
    /// 是否监听进程信号（测试中关闭）
    pub handle_signals: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(5),
            handle_signals: true,
        }
    }
}

impl RuntimeConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置关闭超时时间
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// 启用/禁用进程信号监听
    pub fn with_signal_handling(mut self, enable: bool) -> Self {
        self.handle_signals = enable;
        self
    }
}
