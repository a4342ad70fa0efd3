#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

use taskdesk::auth::rbac::Role;
use taskdesk::auth::Session;
use taskdesk::config::Settings;
use taskdesk::models::User;
use taskdesk::storage::{KeyValueStorage, MemoryStorage};
use taskdesk::ClientContext;

pub fn user(id: i64, username: &str, role: Role) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        role,
        is_active: true,
    }
}

/// Context talking to `server` over fresh in-memory storage.
pub fn create_test_context(server: &MockServer) -> (ClientContext, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context_over(server, storage.clone());
    (ctx, storage)
}

pub fn context_over(server: &MockServer, storage: Arc<MemoryStorage>) -> ClientContext {
    let storage: Arc<dyn KeyValueStorage> = storage;
    ClientContext::with_storage(Settings::for_api(server.uri()), storage)
        .expect("Failed to create test context")
}

/// Context that starts signed in as `user` with access token `A`.
pub fn signed_in_context(server: &MockServer, user: User) -> (ClientContext, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    {
        let seed: Arc<dyn KeyValueStorage> = storage.clone();
        taskdesk::auth::SessionStore::new(seed)
            .save(&Session::new("A".to_string(), "R".to_string(), user))
            .expect("Failed to seed session");
    }
    let ctx = context_over(server, storage.clone());
    (ctx, storage)
}

pub fn task_json(id: i64, title: &str, assignee: Option<i64>, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("{} description", title),
        "due_date": "2026-11-02",
        "status": status,
        "creator": {"id": 1, "username": "alice"},
        "assignee": assignee.map(|id| json!({"id": id, "username": format!("user{}", id)})),
        "last_updated_on": "2026-10-01T12:00:00Z"
    })
}

pub fn user_json(id: i64, username: &str, role: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
        "role": role,
        "is_active": is_active
    })
}
