//! API request/response models.
//!
//! These are the wire types for the HTTP surface, kept separate from the
//! store records so that the persistence layer never leaks into responses
//! (password hashes in particular).

pub mod auth;
pub mod pagination;
pub mod projects;
pub mod tasks;
pub mod users;
