//! Handlers for enrolling in events and listing a seeker's enrollments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use convene_core::types::DbId;
use convene_db::models::enrollment::{Enrollment, EnrollmentListing, EnrollmentScope};
use convene_db::repositories::EnrollmentRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireSeeker;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/events/{id}/enroll
///
/// 201 on success; 400 when already enrolled or the event is full.
pub async fn enroll(
    State(state): State<AppState>,
    RequireSeeker(user): RequireSeeker,
    Path(event_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Enrollment>>)> {
    let enrollment = state
        .engine
        .enroll(event_id, user.user_id, &user.email)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: enrollment })))
}

/// DELETE /api/v1/events/{id}/enroll
///
/// 200 with the CANCELED row; 400 when not enrolled.
pub async fn cancel(
    State(state): State<AppState>,
    RequireSeeker(user): RequireSeeker,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Enrollment>>> {
    let enrollment = state.engine.cancel(event_id, user.user_id).await?;
    Ok(Json(DataResponse { data: enrollment }))
}

async fn list_scoped(
    state: &AppState,
    seeker_id: DbId,
    scope: EnrollmentScope,
    page: &PaginationParams,
) -> AppResult<Json<DataResponse<Vec<EnrollmentListing>>>> {
    let (limit, offset) = page.clamped();
    let rows = EnrollmentRepo::list_for_seeker(
        &state.pool,
        seeker_id,
        scope,
        state.clock.now(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/enrollments
pub async fn list(
    State(state): State<AppState>,
    RequireSeeker(user): RequireSeeker,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<EnrollmentListing>>>> {
    list_scoped(&state, user.user_id, EnrollmentScope::All, &page).await
}

/// GET /api/v1/enrollments/upcoming
///
/// Events that have not started yet, soonest first.
pub async fn list_upcoming(
    State(state): State<AppState>,
    RequireSeeker(user): RequireSeeker,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<EnrollmentListing>>>> {
    list_scoped(&state, user.user_id, EnrollmentScope::Upcoming, &page).await
}

/// GET /api/v1/enrollments/past
pub async fn list_past(
    State(state): State<AppState>,
    RequireSeeker(user): RequireSeeker,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<EnrollmentListing>>>> {
    list_scoped(&state, user.user_id, EnrollmentScope::Past, &page).await
}
