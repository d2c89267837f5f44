pub mod auth;
pub mod enrollment;
pub mod event;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                       register (public)
/// /auth/login                          login (public)
///
/// /events                              list (auth), create (facilitator)
/// /events/mine                         own events (facilitator)
/// /events/{id}                         get (auth), update, delete (owner)
/// /events/{id}/enroll                  enroll, cancel (seeker)
///
/// /enrollments                         own enrollments (seeker)
/// /enrollments/upcoming                not started yet
/// /enrollments/past                    already ended
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", event::router())
        .nest("/enrollments", enrollment::router())
}
