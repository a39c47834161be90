//! Storage-layer record and request types.

pub mod projects;
pub mod tasks;
pub mod users;
