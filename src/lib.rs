use std::sync::Arc;
use crate::{
    auth::{AuthSignal, SessionStore},
    config::Settings,
    error::ClientError,
    repositories::{
        TaskRepository, UserRepository,
        task_repo::HttpTaskRepository,
        user_repo::HttpUserRepository,
    },
    services::{ApiClient, AuthService},
    storage::{FileStorage, KeyValueStorage},
    views::{DashboardView, ProfileView, TasksView, UsersView},
};

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;
pub mod storage;
pub mod views;

/// Everything a front-end needs, built once at startup and passed around by
/// reference.
#[derive(Clone)]
pub struct ClientContext {
    pub settings: Arc<Settings>,
    pub session_store: Arc<SessionStore>,
    pub signal: Arc<AuthSignal>,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl ClientContext {
    /// Context backed by the session file named in the settings.
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&settings.session_file));
        Self::with_storage(settings, storage)
    }

    /// Context over any storage backend; restores a stored session if present.
    pub fn with_storage(
        settings: Settings,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, ClientError> {
        let settings = Arc::new(settings);
        let session_store = Arc::new(SessionStore::new(storage));
        let signal = Arc::new(AuthSignal::new());

        let api = Arc::new(ApiClient::new(&settings, session_store.clone(), signal.clone())?);

        // Subscribes itself to the signal
        let auth = AuthService::new(api.clone(), session_store.clone(), &signal);

        let tasks: Arc<dyn TaskRepository> = Arc::new(HttpTaskRepository::new(api.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(HttpUserRepository::new(api.clone()));

        tracing::debug!(api_base_url = %settings.api_base_url, authenticated = auth.is_authenticated(), "client context ready");

        Ok(Self {
            settings,
            session_store,
            signal,
            api,
            auth,
            tasks,
            users,
        })
    }

    pub fn dashboard_view(&self) -> DashboardView {
        DashboardView::new(self.auth.clone(), self.tasks.clone(), self.users.clone())
    }

    pub fn tasks_view(&self) -> TasksView {
        TasksView::new(self.auth.clone(), self.tasks.clone(), self.users.clone())
    }

    pub fn users_view(&self) -> UsersView {
        UsersView::new(self.auth.clone(), self.users.clone())
    }

    pub fn profile_view(&self) -> Result<ProfileView, ClientError> {
        ProfileView::from_state(&self.auth.state())
    }
}
