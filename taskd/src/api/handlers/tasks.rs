use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        tasks::{ListTasksQuery, TaskAssignment, TaskCreate, TaskResponse, TaskUpdate, UpdateTaskStatus},
        users::{CurrentUser, UserResponse},
    },
    auth::{
        guard,
        policy::{ProjectAction, TaskAction},
    },
    errors::Error,
    store::{
        handlers::Repository,
        models::tasks::{TaskCreateDBRequest, TaskFilter, TaskRecord, TaskUpdateDBRequest},
    },
    types::{TaskId, UserId},
};

/// Build a task response, resolving the assignee if set.
async fn task_response(state: &AppState, task: TaskRecord) -> Result<TaskResponse, Error> {
    let assignee = match task.assignee_id {
        Some(assignee_id) => state.store.users.get_by_id(assignee_id).await?.map(UserResponse::from),
        None => None,
    };
    Ok(TaskResponse::from_record(task, assignee))
}

async fn task_responses(state: &AppState, tasks: Vec<TaskRecord>) -> Result<Vec<TaskResponse>, Error> {
    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(task_response(state, task).await?);
    }
    Ok(responses)
}

/// List tasks visible to the caller
///
/// Tasks the caller may not read are dropped from the listing rather than
/// producing a 403; pagination runs over the visible set.
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Visible tasks", body = PaginatedResponse<TaskResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, Error> {
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        ..Default::default()
    };
    let tasks = state.store.tasks.list(&filter).await?;
    let visible = guard::allowed_tasks(&state.store, &current_user, tasks).await?;
    let total_count = visible.len() as i64;

    let page = task_responses(&state, query.pagination.slice(visible)).await?;
    Ok(Json(PaginatedResponse::new(page, total_count, &query.pagination)))
}

/// Create a task in a project
///
/// Creating a task targets its project: only the project owner or an
/// admin may add tasks.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = TaskCreate,
    tag = "tasks",
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the project owner"),
        (status = 404, description = "Project or assignee not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<TaskCreate>,
) -> Result<(StatusCode, Json<TaskResponse>), Error> {
    let project = guard::require_project(&state.store, request.project_id).await?;
    guard::authorize_project(&state.store, &current_user, ProjectAction::CreateTask, &project).await?;

    let assignee_id = match &request.assignee_email {
        Some(email) => {
            let user = state.store.users.get_by_email(email).await?.ok_or_else(|| Error::NotFound {
                resource: "User".to_string(),
                id: email.clone(),
            })?;
            Some(user.id)
        }
        None => None,
    };

    let task = state
        .store
        .tasks
        .create(&TaskCreateDBRequest {
            title: request.title,
            description: request.description,
            status: request.status,
            priority: request.priority,
            due_date: request.due_date,
            project_id: request.project_id,
            assignee_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task_response(&state, task).await?)))
}

/// Get a task by id
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not owner or assignee"),
        (status = 404, description = "Task not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskResponse>, Error> {
    let task = guard::require_task(&state.store, id).await?;
    guard::authorize_task(&state.store, &current_user, TaskAction::Read, &task).await?;
    Ok(Json(task_response(&state, task).await?))
}

/// Update a task
///
/// Moving the task to another project or changing the assignee is
/// re-validated against the store.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    request_body = TaskUpdate,
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not owner or assignee"),
        (status = 404, description = "Task, project, or assignee not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
    Json(request): Json<TaskUpdate>,
) -> Result<Json<TaskResponse>, Error> {
    let task = guard::require_task(&state.store, id).await?;
    guard::authorize_task(&state.store, &current_user, TaskAction::Update, &task).await?;

    if let Some(project_id) = request.project_id {
        guard::require_project(&state.store, project_id).await?;
    }

    let assignee_id = match &request.assignee_email {
        Some(email) => {
            let user = state.store.users.get_by_email(email).await?.ok_or_else(|| Error::NotFound {
                resource: "User".to_string(),
                id: email.clone(),
            })?;
            Some(Some(user.id))
        }
        None => None,
    };

    let updated = state
        .store
        .tasks
        .update(
            id,
            &TaskUpdateDBRequest {
                title: request.title,
                description: request.description,
                status: request.status,
                priority: request.priority,
                due_date: request.due_date,
                project_id: request.project_id,
                assignee_id,
            },
        )
        .await?;

    Ok(Json(task_response(&state, updated).await?))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not owner or assignee"),
        (status = 404, description = "Task not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, Error> {
    let task = guard::require_task(&state.store, id).await?;
    guard::authorize_task(&state.store, &current_user, TaskAction::Delete, &task).await?;

    state.store.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a task to a user
///
/// Requires the MANAGER role (admins pass implicitly).
#[utoipa::path(
    post,
    path = "/tasks/assign",
    request_body = TaskAssignment,
    tag = "tasks",
    responses(
        (status = 200, description = "Task assigned", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires MANAGER role"),
        (status = 404, description = "Task or user not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<TaskAssignment>,
) -> Result<Json<TaskResponse>, Error> {
    let task = guard::require_task(&state.store, request.task_id).await?;
    guard::require_user(&state.store, request.user_id).await?;
    guard::authorize_task(&state.store, &current_user, TaskAction::Assign, &task).await?;

    let updated = state
        .store
        .tasks
        .update(
            request.task_id,
            &TaskUpdateDBRequest {
                assignee_id: Some(Some(request.user_id)),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(task_response(&state, updated).await?))
}

/// Update the status of a task
///
/// The narrow status transition is reserved for the current assignee
/// (and admins).
#[utoipa::path(
    put,
    path = "/tasks/{id}/status",
    request_body = UpdateTaskStatus,
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Status updated", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Task not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_task_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
    Json(request): Json<UpdateTaskStatus>,
) -> Result<Json<TaskResponse>, Error> {
    let task = guard::require_task(&state.store, id).await?;
    guard::authorize_task(&state.store, &current_user, TaskAction::UpdateStatus, &task).await?;

    let updated = state
        .store
        .tasks
        .update(
            id,
            &TaskUpdateDBRequest {
                status: Some(request.status),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(task_response(&state, updated).await?))
}

/// List tasks assigned to a user
#[utoipa::path(
    get,
    path = "/tasks/user/{user_id}",
    tag = "tasks",
    params(
        ("user_id" = i64, Path, description = "Assignee user id"),
        ListTasksQuery,
    ),
    responses(
        (status = 200, description = "Tasks assigned to the user", body = PaginatedResponse<TaskResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tasks_for_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<UserId>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, Error> {
    guard::require_user(&state.store, user_id).await?;

    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assignee_id: Some(user_id),
        ..Default::default()
    };
    let tasks = state.store.tasks.list(&filter).await?;
    let visible = guard::allowed_tasks(&state.store, &current_user, tasks).await?;
    let total_count = visible.len() as i64;

    let page = task_responses(&state, query.pagination.slice(visible)).await?;
    Ok(Json(PaginatedResponse::new(page, total_count, &query.pagination)))
}
