//! 内置应用服务
//!
//! 未指定前台命令时运行的 HTTP 应用：问候接口和一个简单的用户集合。

pub mod handlers;
pub mod store;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use store::{InMemoryUserStore, UserDocument, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub service_name: Arc<str>,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(service_name: impl Into<Arc<str>>, store: Arc<dyn UserStore>) -> Self {
        Self {
            service_name: service_name.into(),
            store,
        }
    }

    /// 使用内存存储
    pub fn in_memory(service_name: impl Into<Arc<str>>) -> Self {
        Self::new(service_name, Arc::new(InMemoryUserStore::new()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/user", get(handlers::list_users))
        .route("/user/{name}/{idade}", post(handlers::insert_user))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
