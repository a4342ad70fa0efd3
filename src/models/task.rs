use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "inprogress" => Ok(TaskStatus::InProgress),
            "done" | "completed" => Ok(TaskStatus::Done),
            _ => Err(ClientError::validation(format!("Unknown task status '{}'", s))),
        }
    }
}

/// Reference to a user embedded in a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub creator: Option<UserRef>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub last_updated_on: Option<DateTime<Utc>>,
}

impl Task {
    pub fn assignee_id(&self) -> Option<i64> {
        self.assignee.as_ref().map(|a| a.id)
    }

    pub fn is_assigned_to(&self, user_id: i64) -> bool {
        self.assignee_id() == Some(user_id)
    }

    pub fn creator_name(&self) -> &str {
        self.creator
            .as_ref()
            .and_then(|c| c.username.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Body for creating or replacing a task. Updates always send every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
    pub status: TaskStatus,
}

impl TaskPayload {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::validation("Title is required"));
        }
        Ok(())
    }

    /// True when only the status differs from `task`.
    pub fn only_status_differs(&self, task: &Task) -> bool {
        let mut current = TaskPayload::from(task);
        current.status = self.status;
        current == *self
    }
}

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            assignee_id: task.assignee_id(),
            status: task.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignPayload {
    pub assignee_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        let status: TaskStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_sparse_task_deserializes() {
        let task: Task = serde_json::from_str(r#"{"id": 1, "assignee": {"id": 9}}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.is_assigned_to(9));
        assert!(!task.is_assigned_to(7));
        assert_eq!(task.creator_name(), "Unknown");
    }

    #[test]
    fn test_payload_from_task_keeps_fields() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Ship release",
                "description": "Tag and publish",
                "due_date": "2026-11-02",
                "status": "Todo",
                "creator": {"id": 1, "username": "alice"},
                "assignee": {"id": 9, "username": "carol"}
            }"#,
        )
        .unwrap();

        let mut payload = TaskPayload::from(&task);
        assert_eq!(payload.assignee_id, Some(9));
        assert_eq!(payload.due_date, NaiveDate::from_ymd_opt(2026, 11, 2));

        payload.status = TaskStatus::Done;
        assert!(payload.only_status_differs(&task));
        payload.title = "Other".to_string();
        assert!(!payload.only_status_differs(&task));
    }

    #[test]
    fn test_payload_requires_title() {
        assert!(TaskPayload::default().validate().is_err());
    }
}
