//! Store repositories, one per entity collection.

pub mod projects;
pub mod repository;
pub mod tasks;
pub mod users;

pub use repository::Repository;
