//! Router assembly.

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, middleware::profile_filter};

/// Builds the application router.
///
/// Every route runs behind the profile filter so the tenant is bound for
/// all handlers that see a profile. Logout is added after the filter so it
/// never opens a session of its own.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/silent-login-failed", get(auth::silent_login_failed))
        .route("/auth/me", get(auth::me))
        .layer(from_fn_with_state(state.clone(), profile_filter))
        .route("/auth/logout", get(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
