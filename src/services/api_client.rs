use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthSignal, SessionStore};
use crate::config::Settings;
use crate::error::ClientError;
use crate::middleware::auth::{bearer_headers, Rejection};
use crate::middleware::logging::{RequestLog, REQUEST_ID_HEADER};

/// HTTP gateway to the task tracker API.
///
/// Attaches the stored access token to every call and raises the
/// forced-logout signal whenever an authenticated call comes back 401.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_store: Arc<SessionStore>,
    signal: Arc<AuthSignal>,
}

impl ApiClient {
    pub fn new(
        settings: &Settings,
        session_store: Arc<SessionStore>,
        signal: Arc<AuthSignal>,
    ) -> Result<Self, ClientError> {
        settings
            .validate()
            .map_err(|e| ClientError::configuration(e.to_string()))?;

        let client = Client::builder()
            .timeout(settings.http_timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            session_store,
            signal,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Self::decode(response).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send(Method::PUT, path, Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// POST to an endpoint that does not take a session (the login endpoint).
    /// No bearer is attached and a 401 is returned as-is without raising the
    /// forced-logout signal.
    pub async fn post_public<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ClientError> {
        let log = RequestLog::start(&Method::POST, path);
        let request = self
            .client
            .post(self.url(path))
            .header(REQUEST_ID_HEADER, log.correlation_id.as_str())
            .json(body);

        let response = request.send().await.map_err(|e| {
            log.transport_failed(&e);
            ClientError::from(e)
        })?;
        log.completed(response.status());
        Ok(response)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let log = RequestLog::start(&method, path);
        let token = self.session_store.access_token();

        let mut request: RequestBuilder = self
            .client
            .request(method, self.url(path))
            .headers(bearer_headers(token.as_deref())?)
            .header(REQUEST_ID_HEADER, log.correlation_id.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            log.transport_failed(&e);
            ClientError::from(e)
        })?;

        let status = response.status();
        log.completed(status);
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let rejection = Rejection::classify(status, &text);
        if let Rejection::SessionRejected(ref detail) = rejection {
            tracing::warn!(
                correlation_id = %log.correlation_id,
                path = %path,
                detail = %detail,
                "authentication rejected, raising forced logout"
            );
            self.signal.raise();
        }
        Err(rejection.into_error())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rbac::Role;
    use crate::auth::{AuthRejectedListener, Session};
    use crate::models::User;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::{
        matchers::{header, header_exists, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    impl AuthRejectedListener for Counter {
        fn on_auth_rejected(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client_for(server: &MockServer, token: Option<&str>) -> (ApiClient, Arc<AuthSignal>) {
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        if let Some(token) = token {
            store
                .save(&Session::new(
                    token.to_string(),
                    "R".to_string(),
                    User {
                        id: 1,
                        username: "alice".to_string(),
                        email: String::new(),
                        role: Role::Admin,
                        is_active: true,
                    },
                ))
                .unwrap();
        }
        let signal = Arc::new(AuthSignal::new());
        let client = ApiClient::new(&Settings::for_api(server.uri()), store, signal.clone()).unwrap();
        (client, signal)
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_present() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer A"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _) = client_for(&mock_server, Some("A"));
        let tasks: Vec<serde_json::Value> = client.get("/tasks/").await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _) = client_for(&mock_server, None);
        let _: Vec<serde_json::Value> = client.get("tasks/").await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_each_401_raises_signal_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"detail": "Token is invalid or expired"}"#),
            )
            .mount(&mock_server)
            .await;

        let (client, signal) = client_for(&mock_server, Some("stale"));
        let counter = Arc::new(Counter::default());
        let weak = Arc::downgrade(&counter);
        signal.subscribe(weak);

        let first = client.get::<serde_json::Value>("/tasks/").await.unwrap_err();
        let second = client.get::<serde_json::Value>("/users/").await.unwrap_err();

        match first {
            ClientError::Unauthorized(msg) => assert_eq!(msg, "Token is invalid or expired"),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
        assert!(second.is_session_rejection());
        assert_eq!(signal.raised_count(), 2);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_pass_through_without_signal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/tasks/4/"))
            .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"detail": "Not allowed"}"#))
            .mount(&mock_server)
            .await;

        let (client, signal) = client_for(&mock_server, Some("A"));
        let err = client.delete("/tasks/4/").await.unwrap_err();

        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Not allowed");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
        assert_eq!(signal.raised_count(), 0);
    }

    #[tokio::test]
    async fn test_public_post_does_not_raise_signal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let (client, signal) = client_for(&mock_server, Some("A"));
        let response = client
            .post_public("/auth/login/", &serde_json::json!({"username": "a", "password": "b"}))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(signal.raised_count(), 0);
        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[test]
    fn test_url_joining() {
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        let client = ApiClient::new(
            &Settings::for_api("http://localhost:8000/api/"),
            store,
            Arc::new(AuthSignal::new()),
        )
        .unwrap();
        assert_eq!(client.url("/tasks/"), "http://localhost:8000/api/tasks/");
        assert_eq!(client.url("users/3/"), "http://localhost:8000/api/users/3/");
    }
}
