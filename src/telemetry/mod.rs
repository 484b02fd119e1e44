//! 日志初始化

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing subscriber
///
/// `RUST_LOG` 优先，未设置时使用 `logging.level`。
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = build_filter(config)?;

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn build_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow::anyhow!("Invalid log level `{}`: {}", config.level, e)),
    }
}
