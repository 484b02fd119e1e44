use super::AppState;
use super::store::UserDocument;
use crate::error::EntrypointError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserDocument>,
}

pub async fn root(State(state): State<AppState>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello, {}!", state.service_name),
    })
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, StoreFailure> {
    let users = state.store.list().await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn insert_user(
    State(state): State<AppState>,
    Path((name, idade)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>, StoreFailure> {
    let id = state.store.insert(name.clone(), idade).await?;
    info!(user_id = %id, nome = %name, idade, "User inserted");
    Ok(Json(MessageResponse {
        message: format!("usuário: {}, inserido com sucesso", name),
    }))
}

/// 存储错误统一返回 500
pub struct StoreFailure(EntrypointError);

impl From<EntrypointError> for StoreFailure {
    fn from(err: EntrypointError) -> Self {
        StoreFailure(err)
    }
}

impl IntoResponse for StoreFailure {
    fn into_response(self) -> Response {
        error!(error = %self.0, "User store request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}
