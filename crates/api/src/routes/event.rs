//! Route definitions for the `/events` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{enrollment, event};
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /mine          -> list_mine
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// POST   /{id}/enroll   -> enroll
/// DELETE /{id}/enroll   -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(event::list).post(event::create))
        .route("/mine", get(event::list_mine))
        .route(
            "/{id}",
            get(event::get_by_id)
                .put(event::update)
                .delete(event::delete),
        )
        .route(
            "/{id}/enroll",
            post(enrollment::enroll).delete(enrollment::cancel),
        )
}
