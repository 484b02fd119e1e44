//! 前台服务模块
//!
//! 前台要么是外部命令（作为子进程启动），要么是内置应用。

pub mod app_server;
pub mod process;

use crate::config::Config;
use crate::runtime::task::Task;

pub use app_server::AppServer;
pub use process::ServerCommand;

/// 根据配置选择前台任务
pub fn foreground_task(config: &Config) -> Box<dyn Task> {
    match ServerCommand::from_config(config) {
        Some(command) => Box::new(command),
        None => Box::new(AppServer::from_config(config)),
    }
}
