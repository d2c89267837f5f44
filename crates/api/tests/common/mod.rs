#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use convene_api::auth::jwt::{generate_access_token, JwtConfig};
use convene_api::config::ServerConfig;
use convene_api::router::build_app_router;
use convene_api::state::AppState;
use convene_core::clock::SystemClock;
use convene_core::roles::Role;
use convene_core::types::DbId;
use convene_db::models::event::CreateEvent;
use convene_db::models::user::CreateUser;
use convene_db::repositories::{EventRepo, UserRepo};
use convene_notify::RecordingScheduler;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        reminder_sweep_interval_secs: 300,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router backed by a [`RecordingScheduler`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(RecordingScheduler::new()))
}

/// Build the full application router around the given scheduler, so the
/// caller can inspect what was scheduled.
pub fn build_test_app_with(pool: PgPool, scheduler: Arc<RecordingScheduler>) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), scheduler, Arc::new(SystemClock));
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A user inserted directly into the database, with a valid access token.
pub struct TestUser {
    pub id: DbId,
    pub email: String,
    pub token: String,
}

pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> TestUser {
    let email = format!("{username}@test.com");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: email.clone(),
            password_hash: "not-used".to_string(),
            role,
        },
    )
    .await
    .expect("user creation should succeed");

    let token = generate_access_token(user.id, &email, role, &test_config().jwt)
        .expect("token generation should succeed");

    TestUser {
        id: user.id,
        email,
        token,
    }
}

/// Insert an event starting `starts_in` from now, lasting two hours.
pub async fn create_event(
    pool: &PgPool,
    owner: DbId,
    title: &str,
    starts_in: Duration,
    capacity: Option<i32>,
) -> DbId {
    let starts_at = Utc::now() + starts_in;
    EventRepo::create(
        pool,
        owner,
        &CreateEvent {
            title: title.to_string(),
            description: String::new(),
            language: "English".to_string(),
            location: "Online".to_string(),
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            capacity,
        },
    )
    .await
    .expect("event creation should succeed")
    .id
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
