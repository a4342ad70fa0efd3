use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::context::AuthState;
use crate::auth::session::{Session, SessionStore};
use crate::auth::signal::{AuthRejectedListener, AuthSignal};
use crate::error::{ClientError, LOGIN_FALLBACK_MESSAGE};
use crate::middleware::auth::extract_detail;
use crate::models::{LoginRequest, LoginResponse, User};
use crate::services::api_client::ApiClient;

pub const LOGIN_PATH: &str = "/auth/login/";

/// Owns the login/logout lifecycle and the current-user state.
///
/// Anonymous -> Authenticated only through [`AuthService::login`];
/// Authenticated -> Anonymous through [`AuthService::logout`] or the
/// forced-logout signal.
pub struct AuthService {
    client: Arc<ApiClient>,
    session_store: Arc<SessionStore>,
    current: watch::Sender<Option<User>>,
}

impl AuthService {
    /// Builds the service, restores any stored session and subscribes to the
    /// forced-logout signal.
    pub fn new(
        client: Arc<ApiClient>,
        session_store: Arc<SessionStore>,
        signal: &AuthSignal,
    ) -> Arc<Self> {
        let restored = session_store.load().map(|s| s.current_user);
        if let Some(user) = &restored {
            tracing::debug!(user_id = user.id, username = %user.username, "restored stored session");
        }

        let (current, _) = watch::channel(restored);
        let service = Arc::new(Self {
            client,
            session_store,
            current,
        });

        let listener = Arc::downgrade(&service);
        signal.subscribe(listener);
        service
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::validation("Username and password are required"));
        }

        let response = self
            .client
            .post_public(LOGIN_PATH, &LoginRequest { username, password })
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = extract_detail(&body);
            tracing::info!(username = %username, status = %status, "login rejected");
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED {
                ClientError::invalid_credentials(
                    detail.unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string()),
                )
            } else {
                ClientError::http(
                    status.as_u16(),
                    detail.unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string()),
                )
            });
        }

        let session = Self::session_from_body(&body)?;
        self.session_store.save(&session)?;

        let user = session.current_user;
        tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "logged in");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn session_from_body(body: &str) -> Result<Session, ClientError> {
        let parsed: LoginResponse = serde_json::from_str(body)
            .map_err(|e| ClientError::invalid_response(format!("login body is not valid JSON: {}", e)))?;

        let access = parsed
            .access
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::invalid_response("login response has no access token"))?;
        let refresh = parsed
            .refresh
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::invalid_response("login response has no refresh token"))?;
        let user = parsed
            .user
            .ok_or_else(|| ClientError::invalid_response("login response has no user"))?;

        Ok(Session::new(access, refresh, user))
    }

    /// Clears the session. Safe to call when already logged out.
    pub fn logout(&self) {
        self.end_session("logged out");
    }

    fn end_session(&self, reason: &str) {
        if let Err(e) = self.session_store.clear() {
            tracing::warn!(error = %e, "failed to clear stored session");
        }

        let changed = self.current.send_if_modified(|current| current.take().is_some());
        if changed {
            tracing::info!(reason = %reason, "session ended");
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        AuthState::from_user(self.current_user())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Receiver notified on every login/logout transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }
}

impl AuthRejectedListener for AuthService {
    fn on_auth_rejected(&self) {
        if self.is_authenticated() {
            tracing::warn!("server rejected the session, logging out");
        }
        self.end_session("forced logout");
    }
}
