use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;

use crate::error::ClientError;
use crate::models::ErrorBody;

/// Headers carrying the bearer credential, empty when there is no token.
pub fn bearer_headers(token: Option<&str>) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ClientError::storage("stored access token contains characters not allowed in a header")
        })?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Pulls a human-readable message out of an error body: `detail` when the API
/// sends one, otherwise the raw text.
pub fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(ErrorBody {
            detail: Some(detail),
        }) if !detail.trim().is_empty() => Some(detail),
        Ok(_) => Some(trimmed.to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// What a non-success response means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// 401 on an authenticated call: the session is no longer valid.
    SessionRejected(String),
    /// Any other non-success status.
    Failed { status: u16, message: String },
}

impl Rejection {
    pub fn classify(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body);
        if status == StatusCode::UNAUTHORIZED {
            Rejection::SessionRejected(
                detail.unwrap_or_else(|| "Authentication credentials were not accepted".to_string()),
            )
        } else {
            Rejection::Failed {
                status: status.as_u16(),
                message: detail.unwrap_or_default(),
            }
        }
    }

    pub fn into_error(self) -> ClientError {
        match self {
            Rejection::SessionRejected(detail) => ClientError::unauthorized(detail),
            Rejection::Failed { status: 404, message } if message.is_empty() => {
                ClientError::not_found("Resource not found")
            }
            Rejection::Failed { status: 404, message } => ClientError::not_found(message),
            Rejection::Failed { status, message } => ClientError::http(status, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_headers() {
        let headers = bearer_headers(Some("abc.def")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc.def");

        assert!(bearer_headers(None).unwrap().is_empty());
        assert!(bearer_headers(Some("")).unwrap().is_empty());
        assert!(bearer_headers(Some("bad\ntoken")).is_err());
    }

    #[test]
    fn test_extract_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "No active account found"}"#).as_deref(),
            Some("No active account found")
        );
        assert_eq!(extract_detail("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(extract_detail("   "), None);
        assert_eq!(
            extract_detail(r#"{"title": ["This field is required."]}"#).as_deref(),
            Some(r#"{"title": ["This field is required."]}"#)
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            Rejection::classify(StatusCode::UNAUTHORIZED, r#"{"detail": "Token expired"}"#),
            Rejection::SessionRejected("Token expired".to_string())
        );
        assert_eq!(
            Rejection::classify(StatusCode::FORBIDDEN, ""),
            Rejection::Failed {
                status: 403,
                message: String::new()
            }
        );
        assert!(matches!(
            Rejection::classify(StatusCode::NOT_FOUND, "").into_error(),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            Rejection::classify(StatusCode::UNAUTHORIZED, "").into_error(),
            ClientError::Unauthorized(_)
        ));
    }
}
