//! Black-box API tests covering authentication, access control, and the
//! project/task lifecycle.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use taskd::api::models::users::Role;
use taskd::config::Config;
use taskd::store::Store;
use taskd::store::handlers::Repository;
use taskd::store::models::users::UserCreateDBRequest;
use taskd::{AppState, build_router, create_initial_admin_user};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password-123";

fn test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key".to_string()),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..Default::default()
    };
    // Cheap hashing params so tests stay fast
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config.auth.security.jwt_expiry = Duration::from_secs(3600);
    config
}

/// Spin up a test server, returning a handle to the store for direct
/// seeding (e.g. promoting a user to MANAGER).
async fn test_app() -> (TestServer, Arc<Store>, Config) {
    let config = test_config();
    let state = AppState::new(config.clone());
    let store = state.store.clone();

    create_initial_admin_user(ADMIN_EMAIL, Some(ADMIN_PASSWORD), &store)
        .await
        .unwrap();

    let router = build_router(state).unwrap();
    let server = TestServer::new(router).unwrap();
    (server, store, config)
}

/// Register a user and return their bearer token.
async fn register(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/authentication/register")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/authentication/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_project(server: &TestServer, token: &str, name: &str) -> i64 {
    let response = server
        .post("/api/v1/projects")
        .authorization_bearer(token)
        .json(&json!({ "name": name, "description": "test project" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_i64().unwrap()
}

async fn create_task(server: &TestServer, token: &str, project_id: i64, assignee: Option<&str>) -> i64 {
    let mut body = json!({
        "title": "write report",
        "description": "quarterly report",
        "status": "TODO",
        "priority": "MEDIUM",
        "project_id": project_id,
    });
    if let Some(email) = assignee {
        body["assignee_email"] = json!(email);
    }
    let response = server.post("/api/v1/tasks").authorization_bearer(token).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let (server, _store, _config) = test_app().await;

    let register_token = register(&server, "alice@example.com", "password123").await;
    assert!(!register_token.is_empty());

    // Duplicate registration is a conflict with a non-leaking message
    let response = server
        .post("/authentication/register")
        .json(&json!({ "email": "alice@example.com", "password": "password123" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["message"], "An account with this email address already exists");

    // Login succeeds with the right password
    let login_token = login(&server, "alice@example.com", "password123").await;
    assert!(!login_token.is_empty());

    // Both tokens are independently valid
    for token in [&register_token, &login_token] {
        server
            .get("/api/v1/projects")
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::OK);
    }

    // Wrong password and unknown email get the same 401
    for (email, password) in [("alice@example.com", "wrong"), ("ghost@example.com", "password123")] {
        let response = server
            .post("/authentication/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_registration_never_grants_a_role() {
    let (server, store, _config) = test_app().await;

    // A role smuggled into the payload is ignored
    let response = server
        .post("/authentication/register")
        .json(&json!({ "email": "eve@example.com", "password": "password123", "role": "ADMIN" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "USER");

    let record = store.users.get_by_email("eve@example.com").await.unwrap().unwrap();
    assert_eq!(record.role, Role::User);
}

#[tokio::test]
async fn test_password_length_is_validated() {
    let (server, _store, _config) = test_app().await;

    let response = server
        .post("/authentication/register")
        .json(&json!({ "email": "short@example.com", "password": "short" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let (server, _store, _config) = test_app().await;

    // No token
    server.get("/api/v1/tasks").await.assert_status(StatusCode::UNAUTHORIZED);

    // Garbage token
    server
        .get("/api/v1/tasks")
        .authorization_bearer("not.a.token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Tampered token: swap the payload of a real token
    let token = register(&server, "alice@example.com", "password123").await;
    let other = register(&server, "mallory@example.com", "password123").await;
    let mut parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    parts[1] = other_parts[1];
    let tampered = parts.join(".");
    server
        .get("/api/v1/tasks")
        .authorization_bearer(&tampered)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Health and docs stay public
    server.get("/healthz").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_distinguishable() {
    let (server, _store, config) = test_app().await;
    register(&server, "alice@example.com", "password123").await;

    // Forge an already-expired token with the real secret
    let claims = taskd::auth::token::SessionClaims {
        sub: "alice@example.com".to_string(),
        exp: chrono::Utc::now().timestamp() - 60,
        iat: chrono::Utc::now().timestamp() - 3600,
    };
    let key = jsonwebtoken::EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
    let expired = jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &key).unwrap();

    let response = server.get("/api/v1/tasks").authorization_bearer(&expired).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "token_expired");
}

#[tokio::test]
async fn test_task_access_owner_assignee_and_stranger() {
    let (server, _store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    register(&server, "bob@example.com", "password123").await;
    let bob = login(&server, "bob@example.com", "password123").await;
    let carol = register(&server, "carol@example.com", "password123").await;

    let project = create_project(&server, &alice, "roadmap").await;
    let task = create_task(&server, &alice, project, Some("bob@example.com")).await;

    // Owner and assignee can read
    for token in [&alice, &bob] {
        server
            .get(&format!("/api/v1/tasks/{task}"))
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::OK);
    }

    // A stranger gets a 403, not a 404
    let response = server.get(&format!("/api/v1/tasks/{task}")).authorization_bearer(&carol).await;
    response.assert_status(StatusCode::FORBIDDEN);

    // A missing task is a 404 for everyone, checked before authorization
    server
        .get("/api/v1/tasks/9999")
        .authorization_bearer(&carol)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The assignee may transition status; the owner may not
    let response = server
        .put(&format!("/api/v1/tasks/{task}/status"))
        .authorization_bearer(&bob)
        .json(&json!({ "status": "IN_PROGRESS" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "IN_PROGRESS");

    server
        .put(&format!("/api/v1/tasks/{task}/status"))
        .authorization_bearer(&alice)
        .json(&json!({ "status": "DONE" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Owner can update and delete the task itself
    server
        .put(&format!("/api/v1/tasks/{task}"))
        .authorization_bearer(&alice)
        .json(&json!({ "title": "write the report" }))
        .await
        .assert_status(StatusCode::OK);

    server
        .delete(&format!("/api/v1/tasks/{task}"))
        .authorization_bearer(&alice)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_assignment_requires_manager_role() {
    let (server, store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    register(&server, "bob@example.com", "password123").await;
    let bob_record = store.users.get_by_email("bob@example.com").await.unwrap().unwrap();

    // Seed a manager directly; roles are never granted via registration
    store
        .users
        .create(&UserCreateDBRequest {
            email: "mgr@example.com".to_string(),
            password_hash: None,
            role: Role::Manager,
        })
        .await
        .unwrap();
    let mgr = taskd::auth::token::create_session_token("mgr@example.com", &test_config()).unwrap();

    let project = create_project(&server, &alice, "roadmap").await;
    let task = create_task(&server, &alice, project, None).await;

    // The project owner (USER role) cannot assign
    server
        .post("/api/v1/tasks/assign")
        .authorization_bearer(&alice)
        .json(&json!({ "task_id": task, "user_id": bob_record.id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // A manager can
    let response = server
        .post("/api/v1/tasks/assign")
        .authorization_bearer(&mgr)
        .json(&json!({ "task_id": task, "user_id": bob_record.id }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["assignee"]["email"], "bob@example.com");

    // Assigning to an unknown user is a 404
    server
        .post("/api/v1/tasks/assign")
        .authorization_bearer(&mgr)
        .json(&json!({ "task_id": task, "user_id": 9999 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_overrides_everything() {
    let (server, _store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    let admin = login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let project = create_project(&server, &alice, "roadmap").await;
    let task = create_task(&server, &alice, project, None).await;

    // Admin reads, transitions, and deletes without ownership or assignment
    server
        .get(&format!("/api/v1/tasks/{task}"))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::OK);

    server
        .put(&format!("/api/v1/tasks/{task}/status"))
        .authorization_bearer(&admin)
        .json(&json!({ "status": "DONE" }))
        .await
        .assert_status(StatusCode::OK);

    server
        .delete(&format!("/api/v1/projects/{project}"))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_project_ownership_rules() {
    let (server, store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    let carol = register(&server, "carol@example.com", "password123").await;
    let admin = login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let project = create_project(&server, &alice, "roadmap").await;

    // Anyone authenticated can read
    server
        .get(&format!("/api/v1/projects/{project}"))
        .authorization_bearer(&carol)
        .await
        .assert_status(StatusCode::OK);

    // Only the owner mutates
    server
        .put(&format!("/api/v1/projects/{project}"))
        .authorization_bearer(&carol)
        .json(&json!({ "name": "hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // A non-admin cannot create a project owned by someone else
    let carol_record = store.users.get_by_email("carol@example.com").await.unwrap().unwrap();
    server
        .post("/api/v1/projects")
        .authorization_bearer(&alice)
        .json(&json!({ "name": "for carol", "owner_id": carol_record.id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // An admin can
    let response = server
        .post("/api/v1/projects")
        .authorization_bearer(&admin)
        .json(&json!({ "name": "for carol", "owner_id": carol_record.id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["owner_id"].as_i64().unwrap(), carol_record.id);

    // Creating a task in someone else's project is denied
    server
        .post("/api/v1/tasks")
        .authorization_bearer(&carol)
        .json(&json!({
            "title": "sneaky",
            "status": "TODO",
            "priority": "LOW",
            "project_id": project,
        }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_a_project_cascades_to_tasks() {
    let (server, _store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    let project = create_project(&server, &alice, "roadmap").await;
    let task = create_task(&server, &alice, project, None).await;

    server
        .delete(&format!("/api/v1/projects/{project}"))
        .authorization_bearer(&alice)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/v1/tasks/{task}"))
        .authorization_bearer(&alice)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_listing_is_policy_filtered_and_paginated() {
    let (server, _store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    let carol = register(&server, "carol@example.com", "password123").await;

    let project = create_project(&server, &alice, "roadmap").await;
    for _ in 0..3 {
        create_task(&server, &alice, project, None).await;
    }

    // Alice sees her three tasks
    let response = server.get("/api/v1/tasks").authorization_bearer(&alice).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    // Carol sees none of them, with no 403
    let response = server.get("/api/v1/tasks").authorization_bearer(&carol).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total_count"], 0);

    // Pagination runs over the visible set
    let response = server
        .get("/api/v1/tasks?skip=1&limit=1")
        .authorization_bearer(&alice)
        .await;
    let body: Value = response.json();
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["skip"], 1);
    assert_eq!(body["limit"], 1);
}

#[tokio::test]
async fn test_tasks_by_assignee() {
    let (server, store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    register(&server, "bob@example.com", "password123").await;
    let bob = login(&server, "bob@example.com", "password123").await;
    let bob_record = store.users.get_by_email("bob@example.com").await.unwrap().unwrap();

    let project = create_project(&server, &alice, "roadmap").await;
    create_task(&server, &alice, project, Some("bob@example.com")).await;
    create_task(&server, &alice, project, None).await;

    let response = server
        .get(&format!("/api/v1/tasks/user/{}", bob_record.id))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["data"][0]["assignee"]["email"], "bob@example.com");

    // Unknown assignee id is a 404
    server
        .get("/api/v1/tasks/user/9999")
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_filters() {
    let (server, _store, _config) = test_app().await;

    let alice = register(&server, "alice@example.com", "password123").await;
    let project = create_project(&server, &alice, "roadmap").await;

    let first = create_task(&server, &alice, project, None).await;
    create_task(&server, &alice, project, None).await;

    // Move one task to HIGH priority
    server
        .put(&format!("/api/v1/tasks/{first}"))
        .authorization_bearer(&alice)
        .json(&json!({ "priority": "HIGH" }))
        .await
        .assert_status(StatusCode::OK);

    let response = server
        .get("/api/v1/tasks?priority=HIGH")
        .authorization_bearer(&alice)
        .await;
    let body: Value = response.json();
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["data"][0]["id"].as_i64().unwrap(), first);

    let response = server
        .get("/api/v1/tasks?status=TODO")
        .authorization_bearer(&alice)
        .await;
    let body: Value = response.json();
    assert_eq!(body["total_count"], 2);
}
