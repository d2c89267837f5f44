//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped via `clamp_limit` / `clamp_offset` before reaching
/// the repositories.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `(limit, offset)` clamped into their valid ranges.
    pub fn clamped(&self) -> (i64, i64) {
        (
            convene_db::repositories::clamp_limit(self.limit),
            convene_db::repositories::clamp_offset(self.offset),
        )
    }
}
