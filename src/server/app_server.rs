use crate::app::{AppState, router};
use crate::config::Config;
use crate::error::EntrypointError;
use crate::runtime::task::{Task, TaskResult};
use std::future::Future;
use std::pin::Pin;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

/// 内置应用的 HTTP 服务
pub struct AppServer {
    bind: String,
    state: AppState,
}

impl AppServer {
    pub fn new(bind: impl Into<String>, state: AppState) -> Self {
        Self {
            bind: bind.into(),
            state,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            format!("{}:{}", config.server.host, config.server.port),
            AppState::in_memory(config.service.name.as_str()),
        )
    }

    /// 绑定端口并服务，直到收到关闭信号
    pub async fn serve(self, shutdown_rx: oneshot::Receiver<()>) -> Result<(), EntrypointError> {
        let listener = TcpListener::bind(&self.bind)
            .await
            .map_err(|e| EntrypointError::server(format!("Failed to bind {}: {}", self.bind, e)))?;
        self.serve_on(listener, shutdown_rx).await
    }

    /// 在已绑定的 listener 上服务
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<(), EntrypointError> {
        let local = listener.local_addr()?;
        info!(address = %local, "Built-in application server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
                info!("Built-in application server shutting down");
            })
            .await?;
        Ok(())
    }
}

impl Task for AppServer {
    fn name(&self) -> &str {
        "app-server"
    }

    fn run(
        self: Box<Self>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Pin<Box<dyn Future<Output = TaskResult> + Send>> {
        Box::pin(async move { self.serve(shutdown_rx).await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = AppServer::new(addr.to_string(), AppState::in_memory("users"));
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.serve_on(listener, rx));

        let body: serde_json::Value = reqwest::get(format!("http://{}/", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["message"], "Hello, users!");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_server_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let server = AppServer::new(addr.to_string(), AppState::in_memory("users"));
        let (_tx, rx) = oneshot::channel();

        let err = server.serve(rx).await.unwrap_err();
        assert!(matches!(err, EntrypointError::Server(_)));
    }
}
