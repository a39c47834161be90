//! Store repository for projects.

use crate::store::{
    errors::{Result, StoreError},
    handlers::repository::Repository,
    models::projects::{ProjectCreateDBRequest, ProjectRecord, ProjectUpdateDBRequest},
};
use crate::types::{ProjectId, UserId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::instrument;

/// Filter for listing projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub owner_id: Option<UserId>,
}

#[derive(Debug)]
pub struct Projects {
    records: DashMap<ProjectId, ProjectRecord>,
    next_id: AtomicI64,
}

impl Default for Projects {
    fn default() -> Self {
        Self::new()
    }
}

impl Projects {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait::async_trait]
impl Repository for Projects {
    type CreateRequest = ProjectCreateDBRequest;
    type UpdateRequest = ProjectUpdateDBRequest;
    type Response = ProjectRecord;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = ProjectRecord {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            owner_id: request.owner_id,
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
        let mut projects: Vec<ProjectRecord> = self
            .records
            .iter()
            .filter(|entry| match filter.owner_id {
                Some(owner_id) => entry.owner_id == owner_id,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = &request.name {
            entry.name = name.clone();
        }
        if let Some(description) = &request.description {
            entry.description = Some(description.clone());
        }
        if let Some(owner_id) = request.owner_id {
            entry.owner_id = owner_id;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
