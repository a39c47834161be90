//! Store repository for users.

use crate::store::{
    errors::{Result, StoreError},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserRecord, UserUpdateDBRequest},
};
use crate::types::UserId;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::instrument;

/// Filter for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct Users {
    records: DashMap<UserId, UserRecord>,
    /// email → id. Doubles as the uniqueness gate: an email is claimed by
    /// inserting here under the shard lock, so two concurrent creates of
    /// the same address cannot both pass the check.
    email_index: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl Default for Users {
    fn default() -> Self {
        Self::new()
    }
}

impl Users {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            email_index: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Look a user up by email. Emails are unique.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let id = match self.email_index.get(email) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    /// Claim an email for the given id, or fail with a conflict if it is
    /// already taken.
    fn claim_email(&self, email: &str, id: UserId) -> Result<()> {
        match self.email_index.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                resource: "user",
                message: format!("email {email} is already registered"),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl Repository for Users {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserRecord;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.claim_email(&request.email, id)?;

        let now = Utc::now();
        let record = UserRecord {
            id,
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            role: request.role,
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
        let mut users: Vec<UserRecord> = self
            .records
            .iter()
            .filter(|entry| match &filter.email {
                Some(email) => entry.email == *email,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        match self.records.remove(&id) {
            Some((_, record)) => {
                self.email_index.remove(&record.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(email) = &request.email {
            if *email != entry.email {
                // Claim the new address before releasing the old one
                self.claim_email(email, id)?;
                self.email_index.remove(&entry.email);
                entry.email = email.clone();
            }
        }
        if let Some(hash) = &request.password_hash {
            entry.password_hash = Some(hash.clone());
        }
        if let Some(role) = request.role {
            entry.role = role;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
