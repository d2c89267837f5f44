use std::sync::Arc;

use convene_core::clock::Clock;
use convene_core::notification::NotificationScheduler;

use crate::config::ServerConfig;
use crate::engine::EnrollmentEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: convene_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Enroll/cancel with per-event capacity enforcement.
    pub engine: Arc<EnrollmentEngine>,
    /// Time source for upcoming/past splits.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assemble state, wiring the enrollment engine to `scheduler`.
    pub fn new(
        pool: convene_db::DbPool,
        config: ServerConfig,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let engine = Arc::new(EnrollmentEngine::new(pool.clone(), scheduler));
        Self {
            pool,
            config: Arc::new(config),
            engine,
            clock,
        }
    }
}
