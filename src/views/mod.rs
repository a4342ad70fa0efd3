//! Role-scoped views over the task tracker data.
//!
//! Views fetch what they need, derive role-appropriate data from it and run
//! mutations after a local capability check. After a mutation settles the
//! affected collection is fetched again; nothing is patched locally.

pub mod dashboard;
pub mod profile;
pub mod tasks;
pub mod users;

pub use dashboard::{ActivityEntry, DashboardStats, DashboardView, StatCard};
pub use profile::ProfileView;
pub use tasks::{TaskFilter, TasksView};
pub use users::UsersView;

use crate::auth::rbac::Action;
use crate::auth::UserContext;
use crate::error::ClientError;
use crate::models::Task;

/// Collection re-read from the server after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resync {
    Tasks,
    Users,
}

/// Tasks the user may see: everything for Admin/Manager, assigned tasks for
/// Members.
pub fn scope_tasks<'t, 'u>(
    user: &'u UserContext,
    tasks: &'t [Task],
) -> impl Iterator<Item = &'t Task> + 'u
where
    't: 'u,
{
    tasks
        .iter()
        .filter(move |task| user.can_on_task(Action::ViewTask, task))
}

/// Inline error slot shared by the views.
#[derive(Debug, Default, Clone)]
pub(crate) struct ErrorSlot(Option<String>);

impl ErrorSlot {
    pub(crate) fn settle<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match &result {
            Ok(_) => self.0 = None,
            Err(e) => self.0 = Some(e.user_message()),
        }
        result
    }

    pub(crate) fn note(&mut self, err: &ClientError) {
        self.0 = Some(err.user_message());
    }

    pub(crate) fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
