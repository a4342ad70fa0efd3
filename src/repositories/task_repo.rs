use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ClientError;
use crate::models::{AssignPayload, Task, TaskPayload};
use crate::services::ApiClient;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ClientError>;
    async fn get(&self, id: i64) -> Result<Task, ClientError>;
    /// Recently updated tasks for the activity feed.
    async fn recent(&self) -> Result<Vec<Task>, ClientError>;
    async fn create(&self, payload: &TaskPayload) -> Result<(), ClientError>;
    async fn update(&self, id: i64, payload: &TaskPayload) -> Result<(), ClientError>;
    async fn delete(&self, id: i64) -> Result<(), ClientError>;
    async fn assign(&self, id: i64, assignee_id: i64) -> Result<(), ClientError>;
}

pub struct HttpTaskRepository {
    client: Arc<ApiClient>,
}

impl HttpTaskRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskRepository for HttpTaskRepository {
    async fn list(&self) -> Result<Vec<Task>, ClientError> {
        self.client.get("/tasks/").await
    }

    async fn get(&self, id: i64) -> Result<Task, ClientError> {
        self.client.get(&format!("/tasks/{}/", id)).await
    }

    async fn recent(&self) -> Result<Vec<Task>, ClientError> {
        self.client.get("/tasks/recent/").await
    }

    async fn create(&self, payload: &TaskPayload) -> Result<(), ClientError> {
        self.client.post("/tasks/", payload).await
    }

    async fn update(&self, id: i64, payload: &TaskPayload) -> Result<(), ClientError> {
        self.client.put(&format!("/tasks/{}/", id), payload).await
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client.delete(&format!("/tasks/{}/", id)).await
    }

    async fn assign(&self, id: i64, assignee_id: i64) -> Result<(), ClientError> {
        self.client
            .post(
                &format!("/tasks/{}/assign_task/", id),
                &AssignPayload { assignee_id },
            )
            .await
    }
}
