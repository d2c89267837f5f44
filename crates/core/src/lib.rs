//! Convene domain logic.
//!
//! Everything in this crate is pure: no database, network, or runtime
//! dependencies. The `db`, `notify`, and `api` crates build on these types.

pub mod clock;
pub mod enrollment;
pub mod error;
pub mod notification;
pub mod reminder;
pub mod roles;
pub mod types;
pub mod validation;
