pub mod auth;
pub mod enrollment;
pub mod event;
