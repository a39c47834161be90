use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        projects::{ListProjectsQuery, ProjectCreate, ProjectResponse, ProjectUpdate},
        users::CurrentUser,
    },
    auth::{guard, policy::ProjectAction},
    errors::Error,
    store::{
        handlers::{Repository, projects::ProjectFilter},
        models::projects::{ProjectCreateDBRequest, ProjectUpdateDBRequest},
    },
    types::ProjectId,
};

/// List projects
///
/// Any authenticated user may browse projects.
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "List of projects", body = PaginatedResponse<ProjectResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<PaginatedResponse<ProjectResponse>>, Error> {
    let projects = state.store.projects.list(&ProjectFilter::default()).await?;
    let total_count = projects.len() as i64;

    let page: Vec<ProjectResponse> = query
        .pagination
        .slice(projects)
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(Json(PaginatedResponse::new(page, total_count, &query.pagination)))
}

/// Create a new project
///
/// The caller becomes the owner unless an explicit `owner_id` is given,
/// which only admins may do.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = ProjectCreate,
    tag = "projects",
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not allowed to set another owner"),
        (status = 404, description = "Owner not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<ProjectResponse>), Error> {
    let owner_id = match request.owner_id {
        Some(owner_id) if owner_id != current_user.id => {
            if !current_user.is_admin() {
                return Err(Error::InsufficientPermissions {
                    action: crate::types::Operation::Create,
                    resource: "project".to_string(),
                    reason: "only admins may create projects owned by someone else".to_string(),
                });
            }
            guard::require_user(&state.store, owner_id).await?;
            owner_id
        }
        _ => current_user.id,
    };

    let project = state
        .store
        .projects
        .create(&ProjectCreateDBRequest {
            name: request.name,
            description: request.description,
            owner_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

/// Get a project by id
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Project not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_project(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectResponse>, Error> {
    let project = guard::require_project(&state.store, id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/projects/{id}",
    request_body = ProjectUpdate,
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProjectId>,
    Json(request): Json<ProjectUpdate>,
) -> Result<Json<ProjectResponse>, Error> {
    let project = guard::require_project(&state.store, id).await?;
    guard::authorize_project(&state.store, &current_user, ProjectAction::Update, &project).await?;

    // Transferring ownership must point at a real account
    if let Some(new_owner) = request.owner_id {
        guard::require_user(&state.store, new_owner).await?;
    }

    let updated = state
        .store
        .projects
        .update(
            id,
            &ProjectUpdateDBRequest {
                name: request.name,
                description: request.description,
                owner_id: request.owner_id,
            },
        )
        .await?;

    Ok(Json(ProjectResponse::from(updated)))
}

/// Delete a project and all its tasks
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> Result<StatusCode, Error> {
    let project = guard::require_project(&state.store, id).await?;
    guard::authorize_project(&state.store, &current_user, ProjectAction::Delete, &project).await?;

    // Tasks cannot outlive their project
    state.store.tasks.delete_by_project(id).await?;
    state.store.projects.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
