//! API request/response models for tasks.

use super::pagination::Pagination;
use super::users::UserResponse;
use crate::store::models::tasks::TaskRecord;
use crate::types::{ProjectId, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskCreate {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
    /// Optional initial assignee, looked up by email.
    pub assignee_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<ProjectId>,
    pub assignee_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
    pub assignee: Option<UserResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Compose the response from the task record plus its resolved assignee.
    pub fn from_record(record: TaskRecord, assignee: Option<UserResponse>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            status: record.status,
            priority: record.priority,
            due_date: record.due_date,
            project_id: record.project_id,
            assignee,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Reassignment request: hand a task to a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub user_id: UserId,
}

/// Narrow status-transition request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListTasksQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by task status
    pub status: Option<TaskStatus>,

    /// Filter by task priority
    pub priority: Option<TaskPriority>,
}
