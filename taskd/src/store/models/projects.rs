//! Project records and store-level request types.

use crate::types::{ProjectId, UserId};
use chrono::{DateTime, Utc};

/// A project as held in the store.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
}
