//! Resource guard: existence checks and policy enforcement for handlers.
//!
//! Handlers follow a fixed order: load the resource (missing → 404), then
//! run the policy (denied → 403). Existence is revealed before
//! authorization, so an unauthorized caller probing a missing id sees the
//! same 404 as anyone else.

use crate::{
    api::models::users::CurrentUser,
    auth::policy::{self, Decision, ProjectAction, TaskAccess, TaskAction},
    errors::{Error, Result},
    store::Store,
    store::handlers::Repository,
    store::models::{projects::ProjectRecord, tasks::TaskRecord, users::UserRecord},
    types::{Operation, ProjectId, TaskId, UserId},
};

/// Load a task or fail with 404.
pub async fn require_task(store: &Store, id: TaskId) -> Result<TaskRecord> {
    store.tasks.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Task".to_string(),
        id: id.to_string(),
    })
}

/// Load a project or fail with 404.
pub async fn require_project(store: &Store, id: ProjectId) -> Result<ProjectRecord> {
    store.projects.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    })
}

/// Load a user or fail with 404.
pub async fn require_user(store: &Store, id: UserId) -> Result<UserRecord> {
    store.users.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })
}

/// Resolve the ownership facts for a task.
///
/// Every task belongs to a project and every project has an owner; a task
/// whose project or owner is missing is a broken record, reported as an
/// internal error rather than a 404.
pub async fn task_access(store: &Store, task: &TaskRecord) -> Result<TaskAccess> {
    let project = store
        .projects
        .get_by_id(task.project_id)
        .await?
        .ok_or_else(|| Error::Internal {
            operation: format!("task {} references missing project {}", task.id, task.project_id),
        })?;

    let owner = store.users.get_by_id(project.owner_id).await?.ok_or_else(|| Error::Internal {
        operation: format!("project {} references missing owner {}", project.id, project.owner_id),
    })?;

    let assignee = match task.assignee_id {
        Some(assignee_id) => store.users.get_by_id(assignee_id).await?.map(|u| u.email),
        None => None,
    };

    Ok(TaskAccess {
        project_owner: owner.email,
        assignee,
    })
}

fn operation_for_task_action(action: TaskAction) -> Operation {
    match action {
        TaskAction::Read => Operation::Read,
        TaskAction::Update => Operation::Update,
        TaskAction::Delete => Operation::Delete,
        TaskAction::Assign => Operation::Assign,
        TaskAction::UpdateStatus => Operation::UpdateStatus,
    }
}

fn operation_for_project_action(action: ProjectAction) -> Operation {
    match action {
        ProjectAction::CreateTask => Operation::Create,
        ProjectAction::Update => Operation::Update,
        ProjectAction::Delete => Operation::Delete,
    }
}

/// Enforce a task-level action, resolving ownership facts from the store.
pub async fn authorize_task(store: &Store, principal: &CurrentUser, action: TaskAction, task: &TaskRecord) -> Result<()> {
    let access = task_access(store, task).await?;
    match policy::decide_task(principal, action, &access) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(Error::InsufficientPermissions {
            action: operation_for_task_action(action),
            resource: format!("task {}", task.id),
            reason: reason.message().to_string(),
        }),
    }
}

/// Enforce a project-level action.
pub async fn authorize_project(
    store: &Store,
    principal: &CurrentUser,
    action: ProjectAction,
    project: &ProjectRecord,
) -> Result<()> {
    let owner = store
        .users
        .get_by_id(project.owner_id)
        .await?
        .ok_or_else(|| Error::Internal {
            operation: format!("project {} references missing owner {}", project.id, project.owner_id),
        })?;

    match policy::decide_project(principal, action, &owner.email) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(Error::InsufficientPermissions {
            action: operation_for_project_action(action),
            resource: format!("project {}", project.id),
            reason: reason.message().to_string(),
        }),
    }
}

/// Filter a loaded task list down to those the principal may read.
///
/// Listings never 403: tasks the caller cannot see are silently dropped,
/// and pagination runs over the filtered set.
pub async fn allowed_tasks(store: &Store, principal: &CurrentUser, tasks: Vec<TaskRecord>) -> Result<Vec<TaskRecord>> {
    let mut visible = Vec::with_capacity(tasks.len());
    for task in tasks {
        let access = task_access(store, &task).await?;
        if policy::decide_task(principal, TaskAction::Read, &access) == Decision::Allow {
            visible.push(task);
        }
    }
    Ok(visible)
}
