//! Domain services that coordinate repositories and side effects.
//!
//! - [`enrollment`] -- enroll/cancel with per-event capacity enforcement.

pub mod enrollment;

pub use enrollment::EnrollmentEngine;
