//! Input validation for events.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum length of an event title or location.
pub const MAX_TITLE_LEN: u64 = 255;

/// Maximum length of an event language label.
pub const MAX_LANGUAGE_LEN: u64 = 50;

/// An event must end strictly after it starts.
pub fn validate_schedule(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), CoreError> {
    if starts_at >= ends_at {
        return Err(CoreError::Validation(
            "End time must be after start time.".to_string(),
        ));
    }
    Ok(())
}

/// Capacity, when set, must be non-negative.
pub fn validate_capacity(capacity: Option<i32>) -> Result<(), CoreError> {
    match capacity {
        Some(cap) if cap < 0 => Err(CoreError::Validation(format!(
            "capacity must be >= 0, got {cap}"
        ))),
        _ => Ok(()),
    }
}
