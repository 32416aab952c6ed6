use std::net::SocketAddr;
use std::sync::Arc;

use profile_gate_server::{app::build_router, auth::AppState, config::ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        user_info_url = config.provider.user_info_url(),
        channel = ?config.auth.channel,
        sso_enabled = config.auth.sso_enabled,
        "Loaded configuration"
    );

    let app_state =
        Arc::new(AppState::from_config(&config).expect("failed to build application state"));

    // Spawn periodic session cleanup task
    let sessions = app_state.sessions.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            let count = sessions.purge_expired().await;
            if count > 0 {
                tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
