//! 运行时实现
//!
//! 负责：
//! - 任务启动和管理（注册循环、前台服务）
//! - 关闭信号处理
//! - 优雅停机

use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::runtime::config::RuntimeConfig;
use crate::runtime::task::{SpawnTask, Task, TaskResult};
use anyhow::Result;

type NamedResult = (String, TaskResult);

/// 入口程序运行时
///
/// 任一任务结束（例如前台进程退出）或收到关闭信号时，
/// 所有其他任务都会收到关闭信号，不会留下孤立的后台任务。
pub struct ServiceRuntime {
    service_name: String,
    tasks: Vec<Box<dyn Task>>,
    config: RuntimeConfig,
}

impl ServiceRuntime {
    /// 创建新的运行时
    ///
    /// # 参数
    /// * `service_name` - 服务名称（用于日志）
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            tasks: Vec::new(),
            config: RuntimeConfig::default(),
        }
    }

    /// 设置运行时配置
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加任务
    pub fn add_task(mut self, task: Box<dyn Task>) -> Self {
        info!(task_name = %task.name(), "Adding task to runtime");
        self.tasks.push(task);
        self
    }

    /// 添加需要 shutdown_rx 的 spawn 任务
    pub fn add_spawn_with_shutdown<F, Fut>(self, name: impl Into<String>, future_fn: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        self.add_task(Box::new(SpawnTask::with_shutdown(name, future_fn)))
    }

    /// 运行所有任务直到关闭
    ///
    /// 第一个结束的任务如果失败，其错误作为运行结果返回。
    pub async fn run(mut self) -> Result<()> {
        info!(
            service_name = %self.service_name,
            task_count = self.tasks.len(),
            "🚀 Starting entrypoint runtime"
        );

        let tasks = std::mem::take(&mut self.tasks);
        if tasks.is_empty() {
            warn!("No tasks registered, nothing to run");
            return Ok(());
        }
        let (mut join_set, task_shutdowns) = Self::start_tasks(tasks);

        let first = tokio::select! {
            _ = shutdown_signal(self.config.handle_signals) => {
                info!("Shutdown signal received");
                None
            }
            finished = join_set.join_next() => finished,
        };

        let outcome = match first {
            Some(Ok((task_name, Ok(())))) => {
                info!(task_name = %task_name, "Task finished, shutting down runtime");
                Ok(())
            }
            Some(Ok((task_name, Err(e)))) => {
                error!(task_name = %task_name, error = %e, "❌ Task failed, shutting down runtime");
                Err(anyhow::anyhow!("Task '{}' failed: {}", task_name, e))
            }
            Some(Err(e)) => Err(anyhow::anyhow!("Task join error: {}", e)),
            None => Ok(()),
        };

        for tx in task_shutdowns {
            let _ = tx.send(());
        }

        Self::wait_for_tasks_shutdown(&self.config, &mut join_set).await;

        info!(service_name = %self.service_name, "Entrypoint runtime stopped");
        outcome
    }

    fn start_tasks(tasks: Vec<Box<dyn Task>>) -> (JoinSet<NamedResult>, Vec<oneshot::Sender<()>>) {
        let mut join_set = JoinSet::new();
        let mut task_shutdowns = Vec::with_capacity(tasks.len());

        for task in tasks {
            let task_name = task.name().to_string();
            let (task_shutdown_tx, task_shutdown_rx) = oneshot::channel();
            task_shutdowns.push(task_shutdown_tx);

            let task_future = task.run(task_shutdown_rx);
            info!(task_name = %task_name, "Task started");

            join_set.spawn(async move {
                let result = task_future.await;
                (task_name, result)
            });
        }

        (join_set, task_shutdowns)
    }

    /// 等待所有任务关闭，超时后强制中止
    async fn wait_for_tasks_shutdown(config: &RuntimeConfig, join_set: &mut JoinSet<NamedResult>) {
        let drained = tokio::time::timeout(config.shutdown_timeout, async {
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok((task_name, Ok(()))) => {
                        info!(task_name = %task_name, "✅ Task completed gracefully");
                    }
                    Ok((task_name, Err(e))) => {
                        warn!(task_name = %task_name, error = %e, "Task completed with error");
                    }
                    Err(e) => {
                        warn!(error = %e, "Task join error");
                    }
                }
            }
        })
        .await;

        match drained {
            Ok(()) => info!("All tasks completed"),
            Err(_) => {
                warn!(
                    timeout = ?config.shutdown_timeout,
                    "Tasks shutdown timeout, aborting remaining tasks"
                );
                join_set.abort_all();
                while join_set.join_next().await.is_some() {}
            }
        }
    }
}

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal(enabled: bool) {
    if !enabled {
        return std::future::pending().await;
    }

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, falling back to Ctrl+C");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
