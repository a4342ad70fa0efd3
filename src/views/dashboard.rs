use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

use super::{scope_tasks, ErrorSlot};
use crate::auth::rbac::Action;
use crate::auth::UserContext;
use crate::error::ClientError;
use crate::models::{Task, User};
use crate::repositories::{TaskRepository, UserRepository};
use crate::require_capability;
use crate::router::Route;
use crate::services::AuthService;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub task_count: usize,
    /// Active users; `None` for roles that may not list users.
    pub user_count: Option<usize>,
}

/// One clickable summary tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: usize,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub task_id: i64,
    pub title: String,
    pub updated_by: String,
    pub updated_on: Option<DateTime<Utc>>,
}

impl From<&Task> for ActivityEntry {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            updated_by: task.creator_name().to_string(),
            updated_on: task.last_updated_on,
        }
    }
}

/// Newest first, undated entries last.
fn newest_first(a: &ActivityEntry, b: &ActivityEntry) -> Ordering {
    match (a.updated_on, b.updated_on) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub struct DashboardView {
    auth: Arc<AuthService>,
    task_repo: Arc<dyn TaskRepository>,
    user_repo: Arc<dyn UserRepository>,
    stats: DashboardStats,
    activity: Vec<ActivityEntry>,
    errors: ErrorSlot,
}

impl DashboardView {
    pub fn new(
        auth: Arc<AuthService>,
        task_repo: Arc<dyn TaskRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            auth,
            task_repo,
            user_repo,
            stats: DashboardStats::default(),
            activity: Vec::new(),
            errors: ErrorSlot::default(),
        }
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        let result = self.fetch_all().await;
        self.errors.settle(result)
    }

    async fn fetch_all(&mut self) -> Result<(), ClientError> {
        let user = UserContext::require(&self.auth.state())?;
        require_capability!(user, Action::ViewDashboard);

        let users_allowed = user.can(Action::ViewUsers);
        let user_repo = self.user_repo.clone();
        let users_fut = async move {
            if users_allowed {
                Some(user_repo.list().await)
            } else {
                None
            }
        };
        let (tasks, users, recent) =
            tokio::join!(self.task_repo.list(), users_fut, self.task_repo.recent());

        let mut first_error = None;

        match tasks {
            Ok(tasks) => self.stats.task_count = scope_tasks(&user, &tasks).count(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load tasks for dashboard");
                first_error = Some(e);
            }
        }

        match users {
            Some(Ok(users)) => self.stats.user_count = Some(count_active(&users)),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "failed to load users for dashboard");
                first_error.get_or_insert(e);
            }
            None => self.stats.user_count = None,
        }

        match recent {
            Ok(recent) => {
                let mut activity: Vec<ActivityEntry> =
                    scope_tasks(&user, &recent).map(ActivityEntry::from).collect();
                activity.sort_by(newest_first);
                self.activity = activity;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load recent activity");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn greeting(&self) -> String {
        match self.auth.current_user() {
            Some(user) => format!("Welcome back {}", user.username),
            None => "Welcome back User".to_string(),
        }
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn cards(&self) -> Vec<StatCard> {
        let mut cards = Vec::with_capacity(2);
        if let Some(user_count) = self.stats.user_count {
            cards.push(StatCard {
                label: "Active Users",
                value: user_count,
                route: Route::Users,
            });
        }
        cards.push(StatCard {
            label: "Tasks",
            value: self.stats.task_count,
            route: Route::Tasks,
        });
        cards
    }

    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.get()
    }
}

fn count_active(users: &[User]) -> usize {
    users.iter().filter(|u| u.is_active).count()
}
