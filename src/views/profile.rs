use serde::Serialize;

use crate::auth::rbac::Role;
use crate::auth::{AuthState, UserContext};
use crate::error::ClientError;

/// Read-only summary of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: &'static str,
}

impl ProfileView {
    pub fn from_state(state: &AuthState) -> Result<Self, ClientError> {
        let user = UserContext::require(state)?.user;
        Ok(Self {
            username: user.username,
            email: user.email,
            role: user.role,
            status: if user.is_active { "Active" } else { "Inactive" },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    #[test]
    fn test_profile_for_signed_in_user() {
        let user = User {
            id: 2,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            role: Role::Manager,
            is_active: false,
        };
        let profile = ProfileView::from_state(&AuthState::from_user(Some(user))).unwrap();
        assert_eq!(profile.username, "bob");
        assert_eq!(profile.role, Role::Manager);
        assert_eq!(profile.status, "Inactive");
    }

    #[test]
    fn test_profile_requires_login() {
        let err = ProfileView::from_state(&AuthState::Anonymous).unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(err.user_message(), "Please log in to continue.");
    }
}
