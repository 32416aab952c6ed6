//! Authentication routes for the failure view, logout, and profile lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use profile_gate_core::SessionId;
use profile_gate_identity::{TenantContext, UserProfile, profile::ATTR_UNIQUE_IDENTIFIER};
use serde::Serialize;
use time::Duration as TimeDuration;

use super::AppState;
use super::middleware::{CurrentProfile, SESSION_COOKIE};

/// Shown after a failed silent login or a credential submission that was
/// not a form post.
pub async fn silent_login_failed() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Html(
            "<!DOCTYPE html><html><head><title>Login failed</title></head>\
             <body><h1>Login failed</h1>\
             <p>The submitted credentials could not be verified.</p></body></html>",
        ),
    )
}

/// Logs out the user by deleting their session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok())
    {
        if state.sessions.remove(session_id).await.is_some() {
            tracing::debug!(session_id = %session_id, "session removed");
        }
    }

    // Remove session cookie
    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to("/"))
}

/// The resolved identity of the current request.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: ProfileView,
    pub tenant: String,
}

/// Public view of a profile. The provider-issued identifier is left out
/// because it may be the user's access token.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user_id: String,
    pub user_name: String,
    pub organization: String,
    pub roles: Vec<String>,
    pub is_superadmin: bool,
    pub attributes: BTreeMap<String, String>,
    pub resolved_at: DateTime<Utc>,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        let attributes = profile
            .attributes()
            .iter()
            .filter(|(key, _)| key.as_str() != ATTR_UNIQUE_IDENTIFIER)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            user_id: profile.user_id().to_string(),
            user_name: profile.user_name().to_string(),
            organization: profile.organization().to_string(),
            roles: profile.roles().to_vec(),
            is_superadmin: profile.is_superadmin(),
            attributes,
            resolved_at: profile.resolved_at(),
        }
    }
}

/// Returns the profile bound to the request.
pub async fn me(CurrentProfile(profile): CurrentProfile) -> Json<MeResponse> {
    let tenant = TenantContext::current()
        .unwrap_or_else(|| TenantContext::from_profile(&profile))
        .tenant_id()
        .to_string();
    Json(MeResponse {
        profile: ProfileView::from(&profile),
        tenant,
    })
}
