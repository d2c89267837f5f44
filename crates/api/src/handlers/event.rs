//! Handlers for the `/events` resource.
//!
//! Any authenticated user can browse events. Only facilitators create
//! events, and only the owning facilitator may update or delete one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use convene_core::error::CoreError;
use convene_core::types::DbId;
use convene_core::validation::{validate_capacity, validate_schedule};
use convene_db::models::event::{CreateEvent, Event, EventFilter, EventListing, UpdateEvent};
use convene_db::repositories::{EnrollmentRepo, EventRepo};
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireFacilitator;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// An event as returned by the API, with derived seat counts.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub listing: EventListing,
    /// Remaining seats, or `null` for unlimited events.
    pub available_seats: Option<i64>,
}

impl From<EventListing> for EventResponse {
    fn from(listing: EventListing) -> Self {
        Self {
            available_seats: listing.available_seats(),
            listing,
        }
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Event", id })
}

/// Load an event and check the caller owns it.
async fn load_owned(state: &AppState, id: DbId, user: &AuthUser) -> AppResult<Event> {
    let event = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if event.created_by != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the event's creator can modify it".into(),
        )));
    }
    Ok(event)
}

/// Re-read an event with derived fields for the response body.
async fn load_response(state: &AppState, id: DbId, viewer: DbId) -> AppResult<EventResponse> {
    let listing = EventRepo::find_listing(&state.pool, id, viewer)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(listing.into())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/events
///
/// Filters: `location`, `language`, `starts_after`, `starts_before`, `q`.
/// Soonest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<EventFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<EventResponse>>>> {
    let (limit, offset) = page.clamped();
    let events = EventRepo::list(&state.pool, &filter, user.user_id, limit, offset).await?;
    Ok(Json(DataResponse {
        data: events.into_iter().map(EventResponse::from).collect(),
    }))
}

/// GET /api/v1/events/mine
pub async fn list_mine(
    State(state): State<AppState>,
    RequireFacilitator(user): RequireFacilitator,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<EventResponse>>>> {
    let (limit, offset) = page.clamped();
    let events = EventRepo::list_by_owner(&state.pool, user.user_id, limit, offset).await?;
    Ok(Json(DataResponse {
        data: events.into_iter().map(EventResponse::from).collect(),
    }))
}

/// POST /api/v1/events
pub async fn create(
    State(state): State<AppState>,
    RequireFacilitator(user): RequireFacilitator,
    Json(input): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<EventResponse>>)> {
    input.validate()?;
    validate_schedule(input.starts_at, input.ends_at)?;

    let event = EventRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(event_id = event.id, user_id = user.user_id, "Event created");

    let body = load_response(&state, event.id, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: body })))
}

/// GET /api/v1/events/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EventResponse>>> {
    let body = load_response(&state, id, user.user_id).await?;
    Ok(Json(DataResponse { data: body }))
}

/// PUT /api/v1/events/{id}
///
/// Partial update. The schedule check runs against the merged result, so
/// moving only `ends_at` before the stored `starts_at` is rejected.
pub async fn update(
    State(state): State<AppState>,
    RequireFacilitator(user): RequireFacilitator,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<Json<DataResponse<EventResponse>>> {
    input.validate()?;
    let existing = load_owned(&state, id, &user).await?;

    validate_schedule(
        input.starts_at.unwrap_or(existing.starts_at),
        input.ends_at.unwrap_or(existing.ends_at),
    )?;
    validate_capacity(input.capacity.or(existing.capacity))?;

    // Capacity changes take the same event lock as enroll so the count
    // cannot grow past the new cap in between.
    let mut tx = state.pool.begin().await?;
    if let Some(capacity) = input.capacity {
        EnrollmentRepo::lock_event(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let enrolled = EnrollmentRepo::count_enrolled(&mut *tx, id).await?;
        if i64::from(capacity) < enrolled {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Capacity cannot be lower than the {enrolled} seekers already enrolled."
            ))));
        }
    }
    EventRepo::update(&mut *tx, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;
    tracing::info!(event_id = id, user_id = user.user_id, "Event updated");

    let body = load_response(&state, id, user.user_id).await?;
    Ok(Json(DataResponse { data: body }))
}

/// DELETE /api/v1/events/{id}
///
/// Removes the event and all of its enrollments.
pub async fn delete(
    State(state): State<AppState>,
    RequireFacilitator(user): RequireFacilitator,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned(&state, id, &user).await?;

    if EventRepo::delete(&state.pool, id).await? {
        tracing::info!(event_id = id, user_id = user.user_id, "Event deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
