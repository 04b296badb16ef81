//! Civic API Server Entry Point
//!
//! Bootstraps configuration, prepares storage, seeds the default categories,
//! starts the notification dispatcher and serves the Axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use civic_api::notifications::{notifier_from_config, NotificationDispatcher};
use civic_api::telemetry::{init_tracer, TelemetryConfig};
use civic_api::{
    bind_addr_from_env, create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig,
    DbClient, DbConfig, NotifierConfig, StorageBackend, WallClock,
};
use civic_storage::{ComplaintRepository, InMemoryRepository};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let notifier_config = NotifierConfig::from_env();

    let repo: Arc<dyn ComplaintRepository> = match StorageBackend::from_env() {
        StorageBackend::Postgres => {
            let db = DbClient::from_config(&DbConfig::from_env())?;
            db.migrate().await?;
            tracing::info!(pool_size = db.pool_size(), "PostgreSQL storage ready");
            Arc::new(db)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(InMemoryRepository::new())
        }
    };

    let notifier = notifier_from_config(&notifier_config).map_err(|e| {
        ApiError::internal_error(format!("Failed to initialize notifier: {}", e))
    })?;
    tracing::info!(notifier = notifier.name(), "Notification delivery configured");
    let (dispatcher, dispatcher_task) = NotificationDispatcher::spawn(notifier, notifier_config);

    let state = AppState::new(repo, dispatcher, Arc::new(WallClock), api_config);
    state.categories.seed_defaults().await?;

    let app = create_api_router(state, auth_config)?;

    let addr = bind_addr_from_env()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address: {}", e)))?;
    tracing::info!(%addr, "Starting civic API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    dispatcher_task.abort();
    Ok(())
}
