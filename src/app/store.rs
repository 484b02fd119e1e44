//! 用户存储

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 存储中的用户文档，`_id` 以字符串形式输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub idade: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// 插入用户，返回生成的文档 ID
    async fn insert(&self, nome: String, idade: i64) -> Result<String>;

    /// 按插入顺序返回全部用户
    async fn list(&self) -> Result<Vec<UserDocument>>;
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserDocument>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, nome: String, idade: i64) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.users.write().await.push(UserDocument {
            id: id.clone(),
            nome,
            idade,
        });
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<UserDocument>> {
        Ok(self.users.read().await.clone())
    }
}
