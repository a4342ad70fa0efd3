use std::sync::Arc;

use super::{ErrorSlot, Resync};
use crate::auth::rbac::{Action, Role};
use crate::auth::UserContext;
use crate::error::ClientError;
use crate::models::{User, UserPayload};
use crate::repositories::UserRepository;
use crate::require_capability;
use crate::services::AuthService;

pub const MANAGER_NOTICE: &str = "Manager View: You can view users to assign tasks, but user management is restricted to Administrators.";

/// Team member listing. Only Admins may change anything here.
pub struct UsersView {
    auth: Arc<AuthService>,
    user_repo: Arc<dyn UserRepository>,
    users: Vec<User>,
    errors: ErrorSlot,
}

impl UsersView {
    pub fn new(auth: Arc<AuthService>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            auth,
            user_repo,
            users: Vec::new(),
            errors: ErrorSlot::default(),
        }
    }

    fn user(&self) -> Result<UserContext, ClientError> {
        UserContext::require(&self.auth.state())
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        let result = self.fetch().await;
        self.errors.settle(result)
    }

    async fn fetch(&mut self) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::ViewUsers);
        self.users = self.user_repo.list().await?;
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_read_only(&self) -> bool {
        !self
            .user()
            .map(|u| u.can(Action::EditUser))
            .unwrap_or(false)
    }

    /// Banner shown to Managers explaining why the list is read-only.
    pub fn notice(&self) -> Option<&'static str> {
        match self.auth.state().role() {
            Some(Role::Manager) => Some(MANAGER_NOTICE),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.get()
    }

    /// Creates a user. Re-fetches: users.
    pub async fn create(&mut self, payload: UserPayload) -> Result<(), ClientError> {
        let result = self.send_create(&payload).await;
        self.finish(result).await
    }

    async fn send_create(&self, payload: &UserPayload) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::CreateUser);
        payload.validate()?;
        self.user_repo.create(payload).await
    }

    /// Replaces a user's details. Re-fetches: users.
    pub async fn update(&mut self, id: i64, payload: UserPayload) -> Result<(), ClientError> {
        let result = self.send_update(id, &payload).await;
        self.finish(result).await
    }

    async fn send_update(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::EditUser);
        payload.validate()?;
        self.user_repo.update(id, payload).await
    }

    /// Deletes a user. Re-fetches: users.
    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        let result = self.send_delete(id).await;
        self.finish(result).await
    }

    async fn send_delete(&self, id: i64) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::DeleteUser);
        self.user_repo.delete(id).await
    }

    async fn finish(&mut self, result: Result<(), ClientError>) -> Result<(), ClientError> {
        let result = self.errors.settle(result);
        if result.is_ok() {
            self.resync().await;
        }
        result
    }

    async fn resync(&mut self) {
        match self.user_repo.list().await {
            Ok(users) => self.users = users,
            Err(e) => {
                tracing::warn!(error = %e, resync = ?Resync::Users, "re-fetch after mutation failed");
                self.errors.note(&e);
            }
        }
    }
}
