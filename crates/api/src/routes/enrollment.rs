//! Route definitions for the `/enrollments` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::enrollment;
use crate::state::AppState;

/// Routes mounted at `/enrollments`.
///
/// ```text
/// GET /          -> list
/// GET /upcoming  -> list_upcoming
/// GET /past      -> list_past
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(enrollment::list))
        .route("/upcoming", get(enrollment::list_upcoming))
        .route("/past", get(enrollment::list_past))
}
