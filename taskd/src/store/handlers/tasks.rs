//! Store repository for tasks.

use crate::store::{
    errors::{Result, StoreError},
    handlers::repository::Repository,
    models::tasks::{TaskCreateDBRequest, TaskFilter, TaskRecord, TaskUpdateDBRequest},
};
use crate::types::{ProjectId, TaskId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::instrument;

#[derive(Debug)]
pub struct Tasks {
    records: DashMap<TaskId, TaskRecord>,
    next_id: AtomicI64,
}

impl Default for Tasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Tasks {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Remove every task belonging to a project. Returns how many were
    /// deleted. Used when the project itself is deleted.
    pub async fn delete_by_project(&self, project_id: ProjectId) -> Result<usize> {
        let ids: Vec<TaskId> = self
            .records
            .iter()
            .filter(|entry| entry.project_id == project_id)
            .map(|entry| entry.id)
            .collect();
        for id in &ids {
            self.records.remove(id);
        }
        Ok(ids.len())
    }
}

fn matches(record: &TaskRecord, filter: &TaskFilter) -> bool {
    if let Some(status) = filter.status {
        if record.status != status {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if record.priority != priority {
            return false;
        }
    }
    if let Some(assignee_id) = filter.assignee_id {
        if record.assignee_id != Some(assignee_id) {
            return false;
        }
    }
    if let Some(project_id) = filter.project_id {
        if record.project_id != project_id {
            return false;
        }
    }
    true
}

#[async_trait::async_trait]
impl Repository for Tasks {
    type CreateRequest = TaskCreateDBRequest;
    type UpdateRequest = TaskUpdateDBRequest;
    type Response = TaskRecord;
    type Id = TaskId;
    type Filter = TaskFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = TaskRecord {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            due_date: request.due_date,
            project_id: request.project_id,
            assignee_id: request.assignee_id,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut tasks: Vec<TaskRecord> = self
            .records
            .iter()
            .filter(|entry| matches(entry.value(), filter))
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = &request.title {
            entry.title = title.clone();
        }
        if let Some(description) = &request.description {
            entry.description = Some(description.clone());
        }
        if let Some(status) = request.status {
            entry.status = status;
        }
        if let Some(priority) = request.priority {
            entry.priority = priority;
        }
        if let Some(due_date) = request.due_date {
            entry.due_date = Some(due_date);
        }
        if let Some(project_id) = request.project_id {
            entry.project_id = project_id;
        }
        if let Some(assignee_id) = request.assignee_id {
            entry.assignee_id = assignee_id;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::tasks::{TaskPriority, TaskStatus};

    fn create_request(title: &str, project_id: ProjectId) -> TaskCreateDBRequest {
        TaskCreateDBRequest {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            project_id,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_filter_by_status_and_project() {
        let tasks = Tasks::new();
        let a = tasks.create(&create_request("a", 1)).await.unwrap();
        tasks.create(&create_request("b", 2)).await.unwrap();

        tasks
            .update(
                a.id,
                &TaskUpdateDBRequest {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let done = tasks
            .list(&TaskFilter {
                status: Some(TaskStatus::Done),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);

        let in_project = tasks
            .list(&TaskFilter {
                project_id: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_project.len(), 1);
        assert_eq!(in_project[0].title, "b");
    }

    #[tokio::test]
    async fn test_clearing_assignee() {
        let tasks = Tasks::new();
        let created = tasks
            .create(&TaskCreateDBRequest {
                assignee_id: Some(7),
                ..create_request("a", 1)
            })
            .await
            .unwrap();
        assert_eq!(created.assignee_id, Some(7));

        // Untouched field stays put
        let updated = tasks
            .update(created.id, &TaskUpdateDBRequest::default())
            .await
            .unwrap();
        assert_eq!(updated.assignee_id, Some(7));

        // Explicit None clears it
        let updated = tasks
            .update(
                created.id,
                &TaskUpdateDBRequest {
                    assignee_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.assignee_id, None);
    }

    #[tokio::test]
    async fn test_delete_by_project_cascades() {
        let tasks = Tasks::new();
        tasks.create(&create_request("a", 1)).await.unwrap();
        tasks.create(&create_request("b", 1)).await.unwrap();
        let other = tasks.create(&create_request("c", 2)).await.unwrap();

        let deleted = tasks.delete_by_project(1).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(tasks.get_by_id(other.id).await.unwrap().is_some());
    }
}
