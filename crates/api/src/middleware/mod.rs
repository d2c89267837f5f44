//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireFacilitator`] -- Requires the `facilitator` role.
//! - [`rbac::RequireSeeker`] -- Requires the `seeker` role.

pub mod auth;
pub mod rbac;
