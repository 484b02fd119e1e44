//! 外部前台命令

use crate::config::Config;
use crate::error::EntrypointError;
use crate::runtime::task::{Task, TaskResult};
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{info, warn};

/// 默认的优雅退出等待时间
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(4);

/// 优雅退出等待须在运行时关闭超时之前结束，留出强制终止的时间
const KILL_MARGIN: Duration = Duration::from_millis(500);

/// 作为子进程运行的应用服务（例如 `uvicorn server:app --host 0.0.0.0 --port 8000 --reload`）
///
/// 参数原样传递；子进程继承标准输入输出，并通过 `PORT` / `HOST` 环境变量得知监听地址。
/// 关闭时先发送 SIGTERM，超过 `grace_period` 仍未退出再强制终止。
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    grace_period: Duration,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// 配置中没有命令时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        let (program, args) = config.server.command.split_first()?;
        Some(
            Self::new(program.clone())
                .args(args.iter().cloned())
                .env("PORT", config.server.port.to_string())
                .env("HOST", config.server.host.clone())
                .with_grace_period(config.shutdown_timeout().saturating_sub(KILL_MARGIN)),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 启动子进程并等待其退出或关闭信号
    ///
    /// 非零退出码或被信号终止都视为失败；收到关闭信号时杀掉子进程。
    pub async fn run_until_exit(self, shutdown_rx: oneshot::Receiver<()>) -> Result<(), EntrypointError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EntrypointError::server(format!("Failed to start `{}`: {}", self.program, e)))?;

        info!(
            program = %self.program,
            args = ?self.args,
            pid = ?child.id(),
            "Foreground server started"
        );

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    info!(program = %self.program, "Foreground server exited");
                    Ok(())
                } else {
                    Err(EntrypointError::server(format!(
                        "`{}` exited with {}",
                        self.program, status
                    )))
                }
            }
            _ = shutdown_rx => {
                info!(
                    program = %self.program,
                    grace_period = ?self.grace_period,
                    "Stopping foreground server"
                );
                self.stop(&mut child).await;
                Ok(())
            }
        }
    }

    /// SIGTERM，等待 `grace_period`，仍在运行则 SIGKILL
    async fn stop(&self, child: &mut Child) {
        if self.terminate(child) {
            match tokio::time::timeout(self.grace_period, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(program = %self.program, status = %status, "Foreground server stopped");
                    return;
                }
                Ok(Err(e)) => {
                    warn!(program = %self.program, error = %e, "Failed to wait for foreground server");
                }
                Err(_) => {
                    warn!(
                        program = %self.program,
                        grace_period = ?self.grace_period,
                        "Foreground server ignored SIGTERM, killing"
                    );
                }
            }
        }

        if let Err(e) = child.kill().await {
            warn!(program = %self.program, error = %e, "Failed to kill foreground server");
        }
    }

    /// 发送 SIGTERM；无法发送时返回 `false`
    #[cfg(unix)]
    fn terminate(&self, child: &Child) -> bool {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let Some(pid) = child.id() else {
            return false;
        };
        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => true,
            Err(e) => {
                warn!(program = %self.program, pid, error = %e, "Failed to send SIGTERM");
                false
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self, _child: &Child) -> bool {
        false
    }
}

impl Task for ServerCommand {
    fn name(&self) -> &str {
        "server-command"
    }

    fn run(
        self: Box<Self>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Pin<Box<dyn Future<Output = TaskResult> + Send>> {
        Box::pin(async move { self.run_until_exit(shutdown_rx).await.map_err(Into::into) })
    }
}
