use uuid::Uuid;

/// Fallback shown at the login form when the server gives no usable detail.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Unable to login.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The authentication endpoint rejected the credentials. Displays the
    /// server's detail verbatim.
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Invalid response from server")]
    InvalidResponse { reason: String },

    /// A 401 on an authenticated call. The forced-logout signal has already
    /// been raised by the time the caller sees this.
    #[error("Session expired: {0}")]
    Unauthorized(String),

    /// No session to act with. Nothing was sent and nothing was cleared.
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ClientError {
    pub fn invalid_credentials<T: Into<String>>(msg: T) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    pub fn invalid_response<T: Into<String>>(reason: T) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn permission_denied<T: Into<String>>(msg: T) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn http<T: Into<String>>(status: u16, msg: T) -> Self {
        Self::Http {
            status,
            message: msg.into(),
        }
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for failures that end the session (a 401 from an authenticated call).
    pub fn is_session_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials(_) => Some(401),
            Self::Http { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::HttpClient(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short message suitable for inline display next to the control that
    /// failed. Internal failures are logged with a correlation id and replaced
    /// by a generic message.
    pub fn user_message(&self) -> String {
        let error_id = Uuid::new_v4();

        match self {
            Self::InvalidCredentials(msg) => msg.clone(),
            Self::InvalidResponse { reason } => {
                tracing::warn!(
                    error_id = %error_id,
                    reason = %reason,
                    "server returned an unusable response"
                );
                self.to_string()
            }
            Self::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            Self::NotAuthenticated => "Please log in to continue.".to_string(),
            Self::PermissionDenied(msg) => msg.clone(),
            Self::Http { status, message } => {
                tracing::warn!(
                    error_id = %error_id,
                    status = status,
                    error = %message,
                    "request failed"
                );
                if message.is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    message.clone()
                }
            }
            Self::HttpClient(err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "HTTP client error occurred"
                );
                "Unable to reach the server".to_string()
            }
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Serialization(err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "serialization error occurred"
                );
                "Unexpected data received".to_string()
            }
            Self::Storage(msg) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %msg,
                    "session storage error occurred"
                );
                "Local session storage is unavailable".to_string()
            }
            Self::Io(err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "IO error occurred"
                );
                "Local session storage is unavailable".to_string()
            }
            Self::Config(_) | Self::Configuration(_) => self.to_string(),
        }
    }
}
