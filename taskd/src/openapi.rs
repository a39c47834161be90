//! OpenAPI documentation for the HTTP API.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    pagination::Pagination,
    projects::{ProjectCreate, ProjectResponse, ProjectUpdate},
    tasks::{TaskAssignment, TaskCreate, TaskPriority, TaskResponse, TaskStatus, TaskUpdate, UpdateTaskStatus},
    users::{Role, UserResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "taskd API",
        description = "Multi-tenant task tracking with token authentication and ownership-based access control",
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::projects::list_projects,
        handlers::projects::create_project,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::assign_task,
        handlers::tasks::update_task_status,
        handlers::tasks::list_tasks_for_user,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        Role,
        Pagination,
        ProjectCreate,
        ProjectUpdate,
        ProjectResponse,
        TaskCreate,
        TaskUpdate,
        TaskResponse,
        TaskAssignment,
        UpdateTaskStatus,
        TaskStatus,
        TaskPriority,
    )),
    tags(
        (name = "authentication", description = "Registration and login"),
        (name = "projects", description = "Project management"),
        (name = "tasks", description = "Task management"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/tasks/assign"));
        assert!(json.contains("/authentication/login"));
    }
}
