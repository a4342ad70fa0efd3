use std::sync::Arc;

use super::{scope_tasks, ErrorSlot, Resync};
use crate::auth::rbac::Action;
use crate::auth::UserContext;
use crate::error::ClientError;
use crate::models::{Task, TaskPayload, TaskStatus, User};
use crate::repositories::{TaskRepository, UserRepository};
use crate::require_capability;
use crate::services::AuthService;

/// Client-side predicate over the fetched task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub assignee_id: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(assignee_id) = self.assignee_id {
            if !task.is_assigned_to(assignee_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.assignee_id.is_none() && self.status.is_none()
    }
}

pub struct TasksView {
    auth: Arc<AuthService>,
    task_repo: Arc<dyn TaskRepository>,
    user_repo: Arc<dyn UserRepository>,
    tasks: Vec<Task>,
    users: Vec<User>,
    filter: TaskFilter,
    errors: ErrorSlot,
}

impl TasksView {
    pub fn new(
        auth: Arc<AuthService>,
        task_repo: Arc<dyn TaskRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            auth,
            task_repo,
            user_repo,
            tasks: Vec::new(),
            users: Vec::new(),
            filter: TaskFilter::default(),
            errors: ErrorSlot::default(),
        }
    }

    fn user(&self) -> Result<UserContext, ClientError> {
        UserContext::require(&self.auth.state())
    }

    /// Fetches tasks and, for roles that may list users, the assignee choices.
    /// Both requests run concurrently and each result is applied on its own.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let result = self.fetch_all().await;
        self.errors.settle(result)
    }

    async fn fetch_all(&mut self) -> Result<(), ClientError> {
        let user = self.user()?;

        let (tasks, users) = if user.can(Action::ViewUsers) {
            let (tasks, users) = tokio::join!(self.task_repo.list(), self.user_repo.list());
            (tasks, Some(users))
        } else {
            (self.task_repo.list().await, None)
        };

        let mut first_error = None;
        match tasks {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load tasks");
                first_error = Some(e);
            }
        }
        match users {
            Some(Ok(users)) => self.users = users,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "failed to load users");
                first_error.get_or_insert(e);
            }
            None => self.users.clear(),
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Every task returned by the last fetch, before scoping and filtering.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Assignee choices for the task form.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.get()
    }

    /// Tasks to display: role scoping first, then the filter.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let Ok(user) = self.user() else {
            return Vec::new();
        };
        scope_tasks(&user, &self.tasks)
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn loaded_task(&self, id: i64) -> Result<Task, ClientError> {
        self.find(id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("Task {} not found", id)))
    }

    /// Whether the current user may edit anything about `task` (used to show
    /// or hide edit controls).
    pub fn can_edit(&self, task: &Task) -> bool {
        self.user()
            .map(|u| u.can_on_task(Action::EditTaskFields, task))
            .unwrap_or(false)
    }

    pub fn can_update_status(&self, task: &Task) -> bool {
        self.user()
            .map(|u| u.can_on_task(Action::UpdateTaskStatus, task))
            .unwrap_or(false)
    }

    /// Creates a task. Re-fetches: tasks.
    pub async fn create(&mut self, payload: TaskPayload) -> Result<(), ClientError> {
        let result = self.send_create(&payload).await;
        self.finish(result, Resync::Tasks).await
    }

    async fn send_create(&self, payload: &TaskPayload) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::CreateTask);
        payload.validate()?;
        self.task_repo.create(payload).await
    }

    /// Replaces every editable field of a task. Re-fetches: tasks.
    pub async fn update(&mut self, id: i64, payload: TaskPayload) -> Result<(), ClientError> {
        let result = self.send_update(id, &payload).await;
        self.finish(result, Resync::Tasks).await
    }

    async fn send_update(&self, id: i64, payload: &TaskPayload) -> Result<(), ClientError> {
        let user = self.user()?;
        let task = self.loaded_task(id)?;
        // a status-only change is allowed on the narrower capability
        let action = if payload.only_status_differs(&task) {
            Action::UpdateTaskStatus
        } else {
            Action::EditTaskFields
        };
        user.authorize_on_task(action, &task)?;
        if payload.assignee_id != task.assignee_id() {
            user.authorize_on_task(Action::ReassignTask, &task)?;
        }
        payload.validate()?;
        self.task_repo.update(id, payload).await
    }

    /// Changes only the status; every other field is sent unchanged.
    /// Re-fetches: tasks.
    pub async fn update_status(&mut self, id: i64, status: TaskStatus) -> Result<(), ClientError> {
        let result = self.send_status(id, status).await;
        self.finish(result, Resync::Tasks).await
    }

    async fn send_status(&self, id: i64, status: TaskStatus) -> Result<(), ClientError> {
        let user = self.user()?;
        let task = self.loaded_task(id)?;
        user.authorize_on_task(Action::UpdateTaskStatus, &task)?;

        let mut payload = TaskPayload::from(&task);
        payload.status = status;
        self.task_repo.update(id, &payload).await
    }

    /// Moves a task to another user. Re-fetches: tasks.
    pub async fn reassign(&mut self, id: i64, assignee_id: i64) -> Result<(), ClientError> {
        let result = self.send_reassign(id, assignee_id).await;
        self.finish(result, Resync::Tasks).await
    }

    async fn send_reassign(&self, id: i64, assignee_id: i64) -> Result<(), ClientError> {
        let user = self.user()?;
        let task = self.loaded_task(id)?;
        user.authorize_on_task(Action::ReassignTask, &task)?;
        if !self.users.is_empty() && !self.users.iter().any(|u| u.id == assignee_id) {
            return Err(ClientError::validation(format!(
                "User {} is not a known assignee",
                assignee_id
            )));
        }
        self.task_repo.assign(id, assignee_id).await
    }

    /// Deletes a task. Re-fetches: tasks.
    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        let result = self.send_delete(id).await;
        self.finish(result, Resync::Tasks).await
    }

    async fn send_delete(&self, id: i64) -> Result<(), ClientError> {
        let user = self.user()?;
        require_capability!(user, Action::DeleteTask);
        self.task_repo.delete(id).await
    }

    async fn finish(&mut self, result: Result<(), ClientError>, resync: Resync) -> Result<(), ClientError> {
        let result = self.errors.settle(result);
        if result.is_ok() {
            self.resync(resync).await;
        }
        result
    }

    async fn resync(&mut self, resync: Resync) {
        let fetched = match resync {
            Resync::Tasks => self.task_repo.list().await.map(|tasks| self.tasks = tasks),
            Resync::Users => self.user_repo.list().await.map(|users| self.users = users),
        };
        if let Err(e) = fetched {
            tracing::warn!(error = %e, resync = ?resync, "re-fetch after mutation failed");
            self.errors.note(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, assignee: Option<i64>, status: TaskStatus) -> Task {
        let mut task: Task = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
        task.assignee = assignee.map(|id| crate::models::UserRef { id, username: None });
        task.status = status;
        task
    }

    #[test]
    fn test_filter_matches() {
        let done_for_nine = task(1, Some(9), TaskStatus::Done);
        let todo_unassigned = task(2, None, TaskStatus::Todo);

        assert!(TaskFilter::default().matches(&done_for_nine));
        assert!(TaskFilter::default().is_empty());

        let by_assignee = TaskFilter {
            assignee_id: Some(9),
            status: None,
        };
        assert!(by_assignee.matches(&done_for_nine));
        assert!(!by_assignee.matches(&todo_unassigned));

        let by_both = TaskFilter {
            assignee_id: Some(9),
            status: Some(TaskStatus::Todo),
        };
        assert!(!by_both.matches(&done_for_nine));
    }
}
