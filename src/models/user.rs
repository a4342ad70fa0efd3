use serde::{Deserialize, Serialize};

use crate::auth::rbac::Role;
use crate::error::ClientError;

/// Team member as returned by `/users/` and embedded in the login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl Default for UserPayload {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            role: Role::Member,
            is_active: true,
        }
    }
}

impl UserPayload {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.username.trim().is_empty() {
            return Err(ClientError::validation("Username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(ClientError::validation("Email is required"));
        }
        if !self.email.contains('@') {
            return Err(ClientError::validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults_for_sparse_profile() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "username": "alice", "role": "Admin"}"#).unwrap();
        assert_eq!(user.email, "");
        assert!(user.is_active);
        assert!(user.is_admin());
    }

    #[test]
    fn test_payload_validation() {
        let mut payload = UserPayload {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            ..UserPayload::default()
        };
        assert!(payload.validate().is_ok());

        payload.email = "bob".to_string();
        assert!(matches!(payload.validate(), Err(ClientError::Validation(_))));

        payload.username = "  ".to_string();
        assert!(matches!(payload.validate(), Err(ClientError::Validation(_))));
    }
}
