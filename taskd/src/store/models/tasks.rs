//! Task records and store-level request types.

use crate::api::models::tasks::{TaskPriority, TaskStatus};
use crate::types::{ProjectId, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};

/// A task as held in the store.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
    pub assignee_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TaskCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
    pub assignee_id: Option<UserId>,
}

/// Partial update; `assignee_id` uses a nested Option so the caller can
/// distinguish "leave alone" from "clear the assignee".
#[derive(Debug, Clone, Default)]
pub struct TaskUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<ProjectId>,
    pub assignee_id: Option<Option<UserId>>,
}

/// Filter applied by the task list operation before pagination.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<UserId>,
    pub project_id: Option<ProjectId>,
}
