//! Common type definitions and authorization vocabulary.
//!
//! This module defines:
//! - Type aliases for entity IDs (`UserId`, `ProjectId`, `TaskId`)
//! - The [`Operation`] enum used in authorization error messages
//!
//! All entity IDs are sequential `i64` values handed out by the store,
//! matching the numeric identifiers used on the wire.

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type ProjectId = i64;
pub type TaskId = i64;

/// Operations that can be denied by the access policy.
///
/// Only used for reporting: the policy itself works on the more precise
/// action enums in [`crate::auth::policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Assign,
    UpdateStatus,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Assign => write!(f, "assign"),
            Operation::UpdateStatus => write!(f, "update the status of"),
        }
    }
}
