use serde::{Deserialize, Serialize};

use crate::auth::rbac::{self, Action, Ownership, Role};
use crate::error::ClientError;
use crate::models::{Task, User};

/// Authentication state as seen by views and the router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user")]
pub enum AuthState {
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn from_user(user: Option<User>) -> Self {
        match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }
}

/// The signed-in user bundled with capability checks, handed to views.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub user: User,
}

impl UserContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// Resolves the current user from an auth state, failing for anonymous callers.
    pub fn require(state: &AuthState) -> Result<Self, ClientError> {
        state
            .user()
            .cloned()
            .map(Self::new)
            .ok_or(ClientError::NotAuthenticated)
    }

    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can(&self, action: Action) -> bool {
        rbac::can(self.user.role, action, Ownership::Unknown)
    }

    pub fn ownership_of(&self, task: &Task) -> Ownership {
        Ownership::of(task.assignee_id(), self.user.id)
    }

    pub fn can_on_task(&self, action: Action, task: &Task) -> bool {
        rbac::can(self.user.role, action, self.ownership_of(task))
    }

    pub fn authorize_on_task(&self, action: Action, task: &Task) -> Result<(), ClientError> {
        rbac::authorize(self.user.role, action, self.ownership_of(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: String::new(),
            role: Role::Member,
            is_active: true,
        }
    }

    #[test]
    fn test_require_fails_when_anonymous() {
        let err = UserContext::require(&AuthState::Anonymous).unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        // no session existed, so none expired
        assert!(!err.is_session_rejection());
    }

    #[test]
    fn test_task_ownership_checks() {
        let ctx = UserContext::require(&AuthState::Authenticated(member(9))).unwrap();
        let own: Task = serde_json::from_str(r#"{"id": 1, "assignee": {"id": 9}}"#).unwrap();
        let other: Task = serde_json::from_str(r#"{"id": 2, "assignee": {"id": 7}}"#).unwrap();

        assert!(ctx.can_on_task(Action::UpdateTaskStatus, &own));
        assert!(!ctx.can_on_task(Action::UpdateTaskStatus, &other));
        assert!(ctx.authorize_on_task(Action::ViewTask, &other).is_err());
        assert!(!ctx.can(Action::ViewUsers));
    }

    #[test]
    fn test_state_accessors() {
        let state = AuthState::from_user(Some(member(3)));
        assert!(state.is_authenticated());
        assert_eq!(state.role(), Some(Role::Member));
        assert_eq!(AuthState::from_user(None), AuthState::Anonymous);
    }
}
