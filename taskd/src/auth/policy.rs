//! Pure access policy for projects and tasks.
//!
//! All decisions are made from values the caller already holds: the
//! authenticated principal, the action, and the ownership facts of the
//! resource. Nothing in this module touches the store, which keeps every
//! rule unit-testable in isolation.
//!
//! Precedence, highest first:
//!
//! 1. ADMIN is allowed everything.
//! 2. `Assign` requires the MANAGER role.
//! 3. `UpdateStatus` is allowed only to the task's current assignee.
//! 4. Remaining task actions are allowed to the project owner or the
//!    assignee.
//! 5. Project mutations are allowed to the owner.

use crate::api::models::users::{CurrentUser, Role};

/// Task-level actions subject to the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Read,
    Update,
    Delete,
    Assign,
    UpdateStatus,
}

/// Project-level actions subject to the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    CreateTask,
    Update,
    Delete,
}

/// Ownership facts about a task, resolved by the caller.
#[derive(Debug, Clone)]
pub struct TaskAccess {
    /// Email of the owning project's owner.
    pub project_owner: String,
    /// Email of the current assignee, if any.
    pub assignee: Option<String>,
}

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Why a policy check denied the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotOwnerOrAssignee,
    RequiresManagerRole,
    NotAssignee,
    NotOwner,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NotOwnerOrAssignee => "only the project owner or the task assignee may do this",
            DenyReason::RequiresManagerRole => "assigning tasks requires the MANAGER role",
            DenyReason::NotAssignee => "only the current assignee may update the task status",
            DenyReason::NotOwner => "only the project owner may do this",
        }
    }
}

/// Decide a task-level action.
pub fn decide_task(principal: &CurrentUser, action: TaskAction, access: &TaskAccess) -> Decision {
    if principal.role == Role::Admin {
        return Decision::Allow;
    }

    let is_owner = access.project_owner == principal.email;
    let is_assignee = access.assignee.as_deref() == Some(principal.email.as_str());

    match action {
        TaskAction::Assign => {
            if principal.role == Role::Manager {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RequiresManagerRole)
            }
        }
        TaskAction::UpdateStatus => {
            if is_assignee {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotAssignee)
            }
        }
        TaskAction::Read | TaskAction::Update | TaskAction::Delete => {
            if is_owner || is_assignee {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwnerOrAssignee)
            }
        }
    }
}

/// Decide a project-level action against the owner's email.
pub fn decide_project(principal: &CurrentUser, action: ProjectAction, owner: &str) -> Decision {
    if principal.role == Role::Admin {
        return Decision::Allow;
    }

    match action {
        ProjectAction::CreateTask | ProjectAction::Update | ProjectAction::Delete => {
            if owner == principal.email {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
    }
}
