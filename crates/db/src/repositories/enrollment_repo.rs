//! Repository for the `enrollments` table.
//!
//! The enroll path runs inside a caller-managed transaction:
//!
//! 1. [`EnrollmentRepo::lock_event`] takes a row lock on the event. Every
//!    concurrent enroll for the same event queues here, so the count read
//!    in step 2 cannot go stale before step 3 commits. Enrolls on other
//!    events lock other rows and proceed in parallel.
//! 2. [`EnrollmentRepo::find_for_pair`] and
//!    [`EnrollmentRepo::count_enrolled_excluding`] read the current state.
//! 3. [`EnrollmentRepo::upsert_enrolled`] writes the single row for the pair.

use convene_core::enrollment::{STATUS_CANCELED, STATUS_ENROLLED};
use convene_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::enrollment::{
    Enrollment, EnrollmentListing, EnrollmentScope, PendingReminder,
};
use crate::models::event::LockedEvent;

/// Column list for `enrollments` queries.
const COLUMNS: &str = "id, event_id, seeker_id, status, created_at, updated_at";

/// Provides the enrollment state queries.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    // -----------------------------------------------------------------------
    // Transactional enroll path
    // -----------------------------------------------------------------------

    /// Lock the event row for the rest of the transaction.
    ///
    /// Returns `None` if the event does not exist.
    pub async fn lock_event(
        conn: &mut PgConnection,
        event_id: DbId,
    ) -> Result<Option<LockedEvent>, sqlx::Error> {
        sqlx::query_as::<_, LockedEvent>(
            "SELECT id, title, capacity FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await
    }

    /// The pair's row, if one was ever created.
    pub async fn find_for_pair(
        conn: &mut PgConnection,
        event_id: DbId,
        seeker_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE event_id = $1 AND seeker_id = $2"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(event_id)
            .bind(seeker_id)
            .fetch_optional(conn)
            .await
    }

    /// ENROLLED rows on the event, not counting `seeker_id`'s own row.
    pub async fn count_enrolled_excluding(
        conn: &mut PgConnection,
        event_id: DbId,
        seeker_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments \
             WHERE event_id = $1 AND seeker_id <> $2 AND status = $3",
        )
        .bind(event_id)
        .bind(seeker_id)
        .bind(STATUS_ENROLLED)
        .fetch_one(conn)
        .await
    }

    /// Create the pair's row as ENROLLED, or flip an existing row back to
    /// ENROLLED. Never creates a second row for the pair.
    pub async fn upsert_enrolled(
        conn: &mut PgConnection,
        event_id: DbId,
        seeker_id: DbId,
    ) -> Result<Enrollment, sqlx::Error> {
        let query = format!(
            "INSERT INTO enrollments (event_id, seeker_id, status) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_enrollments_event_seeker \
             DO UPDATE SET status = EXCLUDED.status \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(event_id)
            .bind(seeker_id)
            .bind(STATUS_ENROLLED)
            .fetch_one(conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------------

    /// Flip the pair's row from ENROLLED to CANCELED in one conditional write.
    ///
    /// Returns `None` when there is no ENROLLED row for the pair.
    pub async fn cancel(
        pool: &PgPool,
        event_id: DbId,
        seeker_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "UPDATE enrollments SET status = $3 \
             WHERE event_id = $1 AND seeker_id = $2 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(event_id)
            .bind(seeker_id)
            .bind(STATUS_CANCELED)
            .bind(STATUS_ENROLLED)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Number of ENROLLED rows on an event. Runs on a pool or inside a
    /// transaction.
    pub async fn count_enrolled<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE event_id = $1 AND status = $2")
            .bind(event_id)
            .bind(STATUS_ENROLLED)
            .fetch_one(executor)
            .await
    }

    /// All rows on an event regardless of status.
    pub async fn list_for_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE event_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// A seeker's enrollments joined with event title and times.
    ///
    /// `Upcoming` keeps events with `starts_at > now`, soonest first; `Past`
    /// keeps events with `ends_at < now`, most recent first.
    pub async fn list_for_seeker(
        pool: &PgPool,
        seeker_id: DbId,
        scope: EnrollmentScope,
        now: Timestamp,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EnrollmentListing>, sqlx::Error> {
        let (filter, order) = match scope {
            // `$2` must appear in every variant so its type is known.
            EnrollmentScope::All => (
                "AND $2::TIMESTAMPTZ IS NOT NULL",
                "n.created_at DESC, n.id DESC",
            ),
            EnrollmentScope::Upcoming => ("AND e.starts_at > $2", "e.starts_at ASC, n.id ASC"),
            EnrollmentScope::Past => ("AND e.ends_at < $2", "e.ends_at DESC, n.id DESC"),
        };
        let query = format!(
            "SELECT n.id, n.event_id, n.seeker_id, n.status, n.created_at, n.updated_at, \
                    e.title AS event_title, e.starts_at AS event_starts_at, \
                    e.ends_at AS event_ends_at \
             FROM enrollments n \
             JOIN events e ON e.id = n.event_id \
             WHERE n.seeker_id = $1 {filter} \
             ORDER BY {order} \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, EnrollmentListing>(&query)
            .bind(seeker_id)
            .bind(now)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Reminders
    // -----------------------------------------------------------------------

    /// Seekers ENROLLED on the event who have not been reminded yet.
    pub async fn list_pending_reminders(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<PendingReminder>, sqlx::Error> {
        sqlx::query_as::<_, PendingReminder>(
            "SELECT n.id AS enrollment_id, n.seeker_id, u.email \
             FROM enrollments n \
             JOIN users u ON u.id = n.seeker_id \
             WHERE n.event_id = $1 AND n.status = $2 AND n.reminded_at IS NULL \
             ORDER BY n.id",
        )
        .bind(event_id)
        .bind(STATUS_ENROLLED)
        .fetch_all(pool)
        .await
    }

    /// Stamp one enrollment as reminded.
    ///
    /// Returns `false` if it was already stamped.
    pub async fn mark_reminded(
        pool: &PgPool,
        enrollment_id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE enrollments SET reminded_at = $2 \
             WHERE id = $1 AND reminded_at IS NULL",
        )
        .bind(enrollment_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
