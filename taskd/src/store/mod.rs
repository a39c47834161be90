//! In-memory application store.
//!
//! All state lives in concurrent maps guarded by [`dashmap::DashMap`], so
//! repositories take `&self` and the whole store can be shared behind an
//! `Arc` without any outer lock.

pub mod errors;
pub mod handlers;
pub mod models;

use handlers::{projects::Projects, tasks::Tasks, users::Users};

/// The application's entity collections.
#[derive(Debug)]
pub struct Store {
    pub users: Users,
    pub projects: Projects,
    pub tasks: Tasks,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            users: Users::new(),
            projects: Projects::new(),
            tasks: Tasks::new(),
        }
    }
}
