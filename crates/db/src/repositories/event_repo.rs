//! Repository for the `events` table.
//!
//! Listing queries join the owner's email and compute `enrolled_count` and
//! the viewer-relative `is_enrolled` flag in SQL so every read reflects the
//! current persisted enrollment state.

use convene_core::enrollment::STATUS_ENROLLED;
use convene_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::event::{CreateEvent, Event, EventFilter, EventListing, UpdateEvent};

/// Column list for `events` queries.
const COLUMNS: &str = "id, title, description, language, location, starts_at, ends_at, \
    capacity, created_by, created_at, updated_at";

/// `SELECT ... FROM events e JOIN users u` with derived counts.
///
/// `$1` is always the viewer id used for `is_enrolled`.
fn listing_select() -> String {
    format!(
        "SELECT e.id, e.title, e.description, e.language, e.location, \
                e.starts_at, e.ends_at, e.capacity, e.created_by, \
                e.created_at, e.updated_at, \
                u.email AS created_by_email, \
                (SELECT COUNT(*) FROM enrollments n \
                  WHERE n.event_id = e.id AND n.status = '{STATUS_ENROLLED}') AS enrolled_count, \
                EXISTS (SELECT 1 FROM enrollments n \
                  WHERE n.event_id = e.id AND n.seeker_id = $1 \
                    AND n.status = '{STATUS_ENROLLED}') AS is_enrolled \
         FROM events e \
         JOIN users u ON u.id = e.created_by"
    )
}

/// Provides CRUD and sweep queries for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event owned by `created_by`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events \
                (title, description, language, location, starts_at, ends_at, capacity, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.language)
            .bind(&input.location)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.capacity)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find one event with derived counts relative to `viewer_id`.
    pub async fn find_listing(
        pool: &PgPool,
        id: DbId,
        viewer_id: DbId,
    ) -> Result<Option<EventListing>, sqlx::Error> {
        let query = format!("{} WHERE e.id = $2", listing_select());
        sqlx::query_as::<_, EventListing>(&query)
            .bind(viewer_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List events matching `filter`, soonest first.
    pub async fn list(
        pool: &PgPool,
        filter: &EventFilter,
        viewer_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventListing>, sqlx::Error> {
        let query = format!(
            "{} \
             WHERE ($2::TEXT IS NULL OR e.location = $2) \
               AND ($3::TEXT IS NULL OR e.language = $3) \
               AND ($4::TIMESTAMPTZ IS NULL OR e.starts_at >= $4) \
               AND ($5::TIMESTAMPTZ IS NULL OR e.starts_at <= $5) \
               AND ($6::TEXT IS NULL \
                    OR e.title ILIKE '%' || $6 || '%' \
                    OR e.description ILIKE '%' || $6 || '%') \
             ORDER BY e.starts_at ASC, e.id ASC \
             LIMIT $7 OFFSET $8",
            listing_select()
        );
        sqlx::query_as::<_, EventListing>(&query)
            .bind(viewer_id)
            .bind(&filter.location)
            .bind(&filter.language)
            .bind(filter.starts_after)
            .bind(filter.starts_before)
            .bind(&filter.q)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List the events a facilitator owns, soonest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventListing>, sqlx::Error> {
        let query = format!(
            "{} WHERE e.created_by = $1 \
             ORDER BY e.starts_at ASC, e.id ASC \
             LIMIT $2 OFFSET $3",
            listing_select()
        );
        sqlx::query_as::<_, EventListing>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update an event. Only non-`None` fields in `input` are applied.
    ///
    /// Moving `starts_at` clears every enrollment's `reminded_at` so seekers
    /// are reminded about the new start time. Returns `None` if no row with
    /// the given `id` exists.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        // Both statements see the pre-update snapshot, so the subquery reads
        // the old start time.
        let query = format!(
            "WITH rearm AS ( \
                UPDATE enrollments SET reminded_at = NULL \
                WHERE event_id = $1 \
                  AND reminded_at IS NOT NULL \
                  AND $6::TIMESTAMPTZ IS NOT NULL \
                  AND $6 <> (SELECT starts_at FROM events WHERE id = $1) \
             ) \
             UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                language = COALESCE($4, language), \
                location = COALESCE($5, location), \
                starts_at = COALESCE($6, starts_at), \
                ends_at = COALESCE($7, ends_at), \
                capacity = COALESCE($8, capacity) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.language)
            .bind(&input.location)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.capacity)
            .fetch_optional(executor)
            .await
    }

    /// Delete an event and, by cascade, its enrollments.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Events starting inside `[start, end]` with at least one ENROLLED
    /// seeker who has not been reminded yet.
    pub async fn list_due_for_reminder(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e \
             WHERE e.starts_at BETWEEN $1 AND $2 \
               AND EXISTS (SELECT 1 FROM enrollments n \
                            WHERE n.event_id = e.id \
                              AND n.status = '{STATUS_ENROLLED}' \
                              AND n.reminded_at IS NULL) \
             ORDER BY e.starts_at ASC, e.id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }
}
