//! Authentication and authorization.

pub mod current_user;
pub mod guard;
pub mod password;
pub mod policy;
pub mod token;
