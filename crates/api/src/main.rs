use std::sync::Arc;

use convene_core::clock::SystemClock;
use convene_notify::{Delivery, ReminderSweep, TokioScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convene_api::config::ServerConfig;
use convene_api::router::build_app_router;
use convene_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "convene_api=debug,convene_notify=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = convene_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    convene_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    convene_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Notifications ---
    let delivery = Delivery::from_env().expect("Failed to configure email delivery");
    let scheduler = Arc::new(TokioScheduler::new(delivery));
    let clock = Arc::new(SystemClock);

    // Spawn reminder sweep.
    let sweep_cancel = CancellationToken::new();
    let sweep = ReminderSweep::new(pool.clone(), scheduler.clone(), clock.clone())
        .with_interval(config.reminder_sweep_interval());
    let sweep_handle = tokio::spawn({
        let cancel = sweep_cancel.clone();
        async move { sweep.run(cancel).await }
    });

    // --- App state ---
    let state = AppState::new(pool, config.clone(), scheduler.clone(), clock);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = config.bind_addr().expect("HOST must be an IP address");
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = config.shutdown_timeout();

    sweep_cancel.cancel();
    match tokio::time::timeout(grace, sweep_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Reminder sweep task failed"),
        Err(_) => tracing::warn!("Timed out waiting for the reminder sweep to stop"),
    }

    if tokio::time::timeout(grace, scheduler.shutdown()).await.is_err() {
        tracing::warn!("Timed out waiting for in-flight notifications");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
