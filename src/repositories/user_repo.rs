use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ClientError;
use crate::models::{User, UserPayload};
use crate::services::ApiClient;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, ClientError>;
    async fn get(&self, id: i64) -> Result<User, ClientError>;
    async fn create(&self, payload: &UserPayload) -> Result<(), ClientError>;
    async fn update(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError>;
    async fn delete(&self, id: i64) -> Result<(), ClientError>;
}

pub struct HttpUserRepository {
    client: Arc<ApiClient>,
}

impl HttpUserRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserRepository for HttpUserRepository {
    async fn list(&self) -> Result<Vec<User>, ClientError> {
        self.client.get("/users/").await
    }

    async fn get(&self, id: i64) -> Result<User, ClientError> {
        self.client.get(&format!("/users/{}/", id)).await
    }

    async fn create(&self, payload: &UserPayload) -> Result<(), ClientError> {
        self.client.post("/users/", payload).await
    }

    async fn update(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError> {
        self.client.put(&format!("/users/{}/", id), payload).await
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client.delete(&format!("/users/{}/", id)).await
    }
}
