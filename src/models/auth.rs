use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful `/auth/login/` call. Every field is optional here so a
/// partial body can be reported as an invalid response rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Error body used by the API, e.g. `{"detail": "No active account found"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}
