use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Team role. Serialized capitalized; parsing accepts any case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(alias = "admin", alias = "ADMIN")]
    Admin,
    #[serde(alias = "manager", alias = "MANAGER")]
    Manager,
    #[serde(alias = "member", alias = "MEMBER")]
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Member => "Member",
        }
    }
}

impl FromStr for Role {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            other => Err(ClientError::validation(format!("Unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Dashboard
    ViewDashboard,

    // User management
    ViewUsers,
    CreateUser,
    EditUser,
    DeleteUser,

    // Tasks
    ViewAllTasks,
    ViewTask,
    CreateTask,
    DeleteTask,
    EditTaskFields,
    UpdateTaskStatus,
    ReassignTask,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::ViewDashboard,
        Action::ViewUsers,
        Action::CreateUser,
        Action::EditUser,
        Action::DeleteUser,
        Action::ViewAllTasks,
        Action::ViewTask,
        Action::CreateTask,
        Action::DeleteTask,
        Action::EditTaskFields,
        Action::UpdateTaskStatus,
        Action::ReassignTask,
    ];

    fn denial_message(&self, role: Role) -> String {
        match self {
            Action::ViewDashboard => format!("{} accounts cannot view the dashboard", role),
            Action::ViewUsers => "Only administrators and managers can view users".to_string(),
            Action::CreateUser | Action::EditUser | Action::DeleteUser => {
                "User management is restricted to administrators".to_string()
            }
            Action::ViewAllTasks => "Members can only see tasks assigned to them".to_string(),
            Action::ViewTask => "This task is not assigned to you".to_string(),
            Action::CreateTask => "Only administrators and managers can create tasks".to_string(),
            Action::DeleteTask => "Only administrators and managers can delete tasks".to_string(),
            Action::EditTaskFields => {
                "Only administrators and managers can edit task details".to_string()
            }
            Action::UpdateTaskStatus => {
                "Members can only update the status of tasks assigned to them".to_string()
            }
            Action::ReassignTask => {
                "Only administrators and managers can reassign tasks".to_string()
            }
        }
    }
}

/// Relationship between the acting user and the task an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The task is assigned to the acting user.
    Own,
    /// The task is assigned to someone else, or to nobody.
    Other,
    /// No specific resource is involved, or it is not known.
    Unknown,
}

impl Ownership {
    pub const ALL: [Ownership; 3] = [Ownership::Own, Ownership::Other, Ownership::Unknown];

    pub fn of(assignee_id: Option<i64>, user_id: i64) -> Self {
        match assignee_id {
            Some(id) if id == user_id => Ownership::Own,
            _ => Ownership::Other,
        }
    }
}

/// Single source of truth for what a role may do.
pub fn can(role: Role, action: Action, ownership: Ownership) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager => !matches!(
            action,
            Action::CreateUser | Action::EditUser | Action::DeleteUser
        ),
        Role::Member => match action {
            Action::ViewDashboard => true,
            Action::ViewTask | Action::UpdateTaskStatus => ownership == Ownership::Own,
            Action::ViewUsers
            | Action::CreateUser
            | Action::EditUser
            | Action::DeleteUser
            | Action::ViewAllTasks
            | Action::CreateTask
            | Action::DeleteTask
            | Action::EditTaskFields
            | Action::ReassignTask => false,
        },
    }
}

/// Like [`can`], but produces the message shown to the user on denial.
pub fn authorize(role: Role, action: Action, ownership: Ownership) -> Result<(), ClientError> {
    if can(role, action, ownership) {
        Ok(())
    } else {
        tracing::debug!(role = %role, action = ?action, ownership = ?ownership, "action denied locally");
        Err(ClientError::permission_denied(action.denial_message(role)))
    }
}

impl Role {
    /// Actions this role may take on resources it owns or that need no ownership.
    pub fn capabilities(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| can(*self, *action, Ownership::Own))
            .collect()
    }

    pub fn can(&self, action: Action, ownership: Ownership) -> bool {
        can(*self, action, ownership)
    }
}

#[macro_export]
macro_rules! require_capability {
    ($user:expr, $action:expr) => {
        $crate::auth::rbac::authorize($user.role(), $action, $crate::auth::rbac::Ownership::Unknown)?
    };
    ($user:expr, $action:expr, $ownership:expr) => {
        $crate::auth::rbac::authorize($user.role(), $action, $ownership)?
    };
}
