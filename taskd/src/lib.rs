//! # taskd
//!
//! A multi-tenant task tracking API with stateless token authentication and
//! ownership-based access control.
//!
//! The core pieces:
//!
//! - [`auth::token`]: compact HS256 session tokens. Only the subject is
//!   embedded; roles are resolved fresh per request.
//! - [`auth::current_user`]: the extractor turning a bearer header into an
//!   authenticated principal.
//! - [`auth::policy`]: the pure access rules (admin override, manager-gated
//!   assignment, assignee-only status transitions, owner/assignee CRUD).
//! - [`auth::guard`]: load-then-authorize helpers used by every protected
//!   handler.
//! - [`store`]: concurrent in-memory repositories for users, projects, and
//!   tasks.
//!
//! ## Usage
//!
//! ```no_run
//! use taskd::{Application, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let app = Application::new(config).await?;
//! app.serve(std::future::pending()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod openapi;
pub mod store;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::{ProjectId, TaskId, UserId};

use crate::api::models::users::Role;
use crate::auth::password;
use crate::config::CorsOrigin;
use crate::errors::Error;
use crate::openapi::ApiDoc;
use crate::store::{
    Store,
    handlers::Repository,
    models::users::{UserCreateDBRequest, UserUpdateDBRequest},
};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: Arc::new(Store::new()),
            config,
        }
    }
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin on first startup, or refreshes the
/// password if the account already exists and a password is configured.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, store: &Store) -> Result<UserId, Error> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string(pwd)?),
        None => None,
    };

    if let Some(existing_user) = store.users.get_by_email(email).await? {
        if password_hash.is_some() {
            store
                .users
                .update(
                    existing_user.id,
                    &UserUpdateDBRequest {
                        password_hash,
                        ..Default::default()
                    },
                )
                .await?;
        }
        return Ok(existing_user.id);
    }

    let created_user = store
        .users
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

    info!("Created initial admin user {}", created_user.email);
    Ok(created_user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Authentication routes at root level
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .with_state(state.clone());

    // Protected API routes
    let api_routes = Router::new()
        .route(
            "/projects",
            get(api::handlers::projects::list_projects).post(api::handlers::projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(api::handlers::projects::get_project)
                .put(api::handlers::projects::update_project)
                .delete(api::handlers::projects::delete_project),
        )
        .route(
            "/tasks",
            get(api::handlers::tasks::list_tasks).post(api::handlers::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(api::handlers::tasks::get_task)
                .put(api::handlers::tasks::update_task)
                .delete(api::handlers::tasks::delete_task),
        )
        .route("/tasks/assign", post(api::handlers::tasks::assign_task))
        .route("/tasks/{id}/status", put(api::handlers::tasks::update_task_status))
        .route("/tasks/user/{user_id}", get(api::handlers::tasks::list_tasks_for_user))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] initializes state and seeds the
///    initial admin user.
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting taskd with configuration: {:#?}", config);

        let state = AppState::new(config.clone());

        // Create initial admin user if it doesn't exist
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &state.store)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("taskd listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
