//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that take part in a caller-managed transaction accept
//! `&mut PgConnection` (pass `&mut *tx`); the rest accept `&PgPool`.

pub mod enrollment_repo;
pub mod event_repo;
pub mod user_repo;

pub use enrollment_repo::EnrollmentRepo;
pub use event_repo::EventRepo;
pub use user_repo::UserRepo;

/// Maximum page size for list queries.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: i64 = 50;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
