use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use llmdash_core::scripting::catalog::ScriptCatalog;
use llmdash_core::scripting::runner::CommandRunner;
use llmdash_core::scripting::wrap::SshCommandWrapper;
use llmdash_db::latest::LatestStateCache;
use llmdash_events::EventBroadcaster;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llmdash_api::background;
use llmdash_api::config::ServerConfig;
use llmdash_api::router::build_app_router;
use llmdash_api::scripting::ScriptSupervisor;
use llmdash_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llmdash_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = llmdash_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    tracing::info!(url = %config.database_url, "Database connection pool created");

    llmdash_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    llmdash_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Live events ---
    let broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));

    // --- Script supervisor ---
    let catalog = ScriptCatalog::load_or_empty(&config.scripts_config_path).await;
    let wrapper = SshCommandWrapper::detect(config.ssh_password.clone());
    let supervisor = Arc::new(ScriptSupervisor::new(
        catalog,
        config.scripts_config_path.clone(),
        CommandRunner::shell(Arc::new(wrapper)),
        config.script_command_timeout(),
        Arc::clone(&broadcaster),
    ));

    // --- Retention ---
    let retention_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(background::metrics_retention::run(
        pool.clone(),
        config.metrics_retention(),
        config.metrics_cleanup_interval(),
        retention_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        latest: LatestStateCache::new(pool.clone()),
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        broadcaster: Arc::clone(&broadcaster),
        supervisor,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Live subscriptions are closed as soon as the signal arrives so open
    // WebSocket connections do not hold up the drain.
    let shutdown_broadcaster = Arc::clone(&broadcaster);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!(
                subscribers = shutdown_broadcaster.subscriber_count(),
                "Closing live subscribers"
            );
            shutdown_broadcaster.close_all();
        })
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Retention job stopped");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
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
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
