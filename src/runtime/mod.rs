//! 入口程序运行时
//!
//! 统一管理后台注册循环和前台服务的生命周期：
//!
//! 1. 启动所有任务（`JoinSet`）
//! 2. 等待关闭信号（Ctrl+C / SIGTERM）或任一任务结束
//! 3. 向所有任务发送关闭信号，超时后强制中止
//!
//! ```rust,no_run
//! use consul_entrypoint::runtime::ServiceRuntime;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let runtime = ServiceRuntime::new("app")
//!     .add_spawn_with_shutdown("worker", |shutdown_rx| async move {
//!         let _ = shutdown_rx.await;
//!         Ok(())
//!     });
//!
//! runtime.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod runtime;
pub mod task;

pub use config::RuntimeConfig;
pub use runtime::ServiceRuntime;
pub use task::{SpawnTask, Task, TaskResult};
