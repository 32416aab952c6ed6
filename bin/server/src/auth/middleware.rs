//! The profile filter and the extractors that read its results.
//!
//! Every request passes through `profile_filter`, which:
//! 1. opens the session named by the `session` cookie, creating one if needed
//! 2. reuses the session's profile, or looks for an identity on the request
//!    (SSO header or submitted credentials, depending on configuration)
//! 3. resolves and stores the profile when a new identity was found
//! 4. runs the rest of the chain with the profile's tenant bound
//!
//! Requests without an identity continue without a profile. Failed silent
//! logins and credentials sent without a form post are redirected to the
//! failure view and never reach the handler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{Method, StatusCode, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use profile_gate_core::{RequestId, SessionId};
use profile_gate_identity::{
    AuthEntry, AuthenticationError, EntryPath, TenantContext, UserProfile, credentials, resolve,
};
use rootcause::prelude::Report;
use time::Duration as TimeDuration;
use tracing::Instrument;

use super::AppState;
use crate::config::SessionConfig;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Largest form body read while looking for credentials.
const MAX_FORM_BYTES: usize = 64 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Authenticates the request and binds its tenant for the rest of the chain.
pub async fn profile_filter(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let request_id = RequestId::new();
    let span = tracing::info_span!("profile_filter", request_id = %request_id);

    filter(state, remote_addr, jar, request, next)
        .instrument(span)
        .await
}

async fn filter(
    state: Arc<AppState>,
    remote_addr: SocketAddr,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let cookie_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok());
    let opened = state.sessions.open(cookie_id).await;
    let session_id = opened.state.id();
    let remote = remote_addr.ip().to_string();

    let stored = opened.state.profile().cloned();
    let response = match authenticate(&state, stored, session_id, &remote, request).await {
        Ok((request, profile)) => continue_chain(request, profile, next).await,
        Err(rejection) => rejection.into_response(),
    };

    if opened.created {
        let cookie = session_cookie(session_id, &state.session_config);
        (jar.add(cookie), response).into_response()
    } else {
        response
    }
}

async fn authenticate(
    state: &AppState,
    stored: Option<UserProfile>,
    session_id: SessionId,
    remote: &str,
    request: Request,
) -> Result<(Request, Option<UserProfile>), AuthRejection> {
    let (request, entry) = match stored {
        Some(profile) => {
            tracing::debug!(session_id = %session_id, "reusing session profile");
            (request, Some(AuthEntry::ExistingSession(Box::new(profile))))
        }
        None => select_entry(state, request).await?,
    };

    let Some(entry) = entry else {
        tracing::debug!(session_id = %session_id, "no identity on request");
        return Ok((request, None));
    };

    let resolution = resolve(entry, state.resolver.as_ref(), remote)
        .await
        .map_err(|report| rejection(&report, &state.auth_config.failure_path))?;

    if resolution.fresh {
        state
            .sessions
            .store_profile(session_id, resolution.profile.clone())
            .await;
        if resolution.silent_login {
            state.sessions.mark_silent_login(session_id).await;
        }
        tracing::debug!(
            session_id = %session_id,
            user = resolution.profile.user_id(),
            "stored profile in session"
        );
    }

    Ok((request, Some(resolution.profile)))
}

async fn select_entry(
    state: &AppState,
    request: Request,
) -> Result<(Request, Option<AuthEntry>), AuthRejection> {
    let failure_path = &state.auth_config.failure_path;

    match state.auth_config.entry_path() {
        EntryPath::SsoDelegate => {
            let entry = state
                .sso
                .read_user_identifier(request.headers())
                .map(AuthEntry::SsoToken);
            Ok((request, entry))
        }
        EntryPath::DirectCredentials => {
            let (request, params) = request_parameters(request).await?;
            let found = credentials::extract(&params, state.decrypter.as_ref())
                .map_err(|e| AuthRejection::from_error(&e, failure_path))?;
            let Some(found) = found else {
                return Ok((request, None));
            };

            if request.method() != Method::POST {
                let err = AuthenticationError::InvalidMethod {
                    method: request.method().to_string(),
                };
                tracing::error!(user = found.username(), error = %err, "credentials rejected");
                return Err(AuthRejection::from_error(&err, failure_path));
            }

            Ok((request, Some(AuthEntry::DirectCredentials(found))))
        }
    }
}

/// Collects query and form parameters, keeping the first value of each name.
///
/// A form body is buffered and put back so the handler can still read it.
/// Bodies of unknown length or larger than `MAX_FORM_BYTES` are left
/// untouched and only the query string is searched.
async fn request_parameters(
    request: Request,
) -> Result<(Request, HashMap<String, String>), AuthRejection> {
    let mut params = HashMap::new();
    if let Some(query) = request.uri().query() {
        collect_pairs(query.as_bytes(), &mut params);
    }

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_form_content_type);
    if !is_form {
        return Ok((request, params));
    }

    let body_len = request.body().size_hint().upper();
    if !body_len.is_some_and(|len| len <= MAX_FORM_BYTES as u64) {
        tracing::debug!(?body_len, "form body not searched for credentials");
        return Ok((request, params));
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|e| {
        tracing::warn!(error = %e, "failed to read form body");
        AuthRejection::InvalidRequest
    })?;
    collect_pairs(&bytes, &mut params);

    Ok((Request::from_parts(parts, Body::from(bytes)), params))
}

fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn collect_pairs(input: &[u8], params: &mut HashMap<String, String>) {
    for (name, value) in url::form_urlencoded::parse(input) {
        params
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
}

async fn continue_chain(mut request: Request, profile: Option<UserProfile>, next: Next) -> Response {
    let Some(profile) = profile else {
        return next.run(request).await;
    };

    let tenant = TenantContext::from_profile(&profile);
    request.extensions_mut().insert(tenant.clone());
    request.extensions_mut().insert(profile);

    tenant.scope(next.run(request)).await
}

fn session_cookie(id: SessionId, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(config.duration_minutes))
        .build()
}

fn rejection(report: &Report<AuthenticationError>, failure_path: &str) -> AuthRejection {
    match report.current_context() {
        AuthenticationError::AccessDenied { .. } => {
            tracing::warn!(error = %report, "access denied");
        }
        _ => tracing::error!(error = %report, "authentication failed"),
    }
    AuthRejection::from_error(report.current_context(), failure_path)
}

/// Extractor for the profile resolved by the profile filter.
pub struct CurrentProfile(pub UserProfile);

impl<S> FromRequestParts<S> for CurrentProfile
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserProfile>()
            .cloned()
            .map(CurrentProfile)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Extractor for optionally getting the resolved profile.
pub struct OptionalProfile(pub Option<UserProfile>);

impl<S> FromRequestParts<S> for OptionalProfile
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalProfile(parts.extensions.get::<UserProfile>().cloned()))
    }
}

/// Extractor for the tenant bound to the request.
pub struct CurrentTenant(pub TenantContext);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(CurrentTenant)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Rejection type for the profile filter and its extractors.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    NotAuthenticated,
    /// A silent login failed; the user is sent to the failure view.
    LoginFailed {
        location: String,
    },
    AccessDenied,
    ProviderFailure,
    InvalidRequest,
    InternalError,
}

impl AuthRejection {
    /// Maps an authentication failure to the response the user sees.
    #[must_use]
    pub fn from_error(error: &AuthenticationError, failure_path: &str) -> Self {
        match error {
            AuthenticationError::InvalidMethod { .. }
            | AuthenticationError::SilentAuthenticationFailed { .. } => Self::LoginFailed {
                location: failure_path.to_string(),
            },
            AuthenticationError::AccessDenied { .. } => Self::AccessDenied,
            e if e.is_provider_failure() => Self::ProviderFailure,
            _ => Self::InternalError,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated").into_response(),
            Self::LoginFailed { location } => Redirect::to(&location).into_response(),
            Self::AccessDenied => (StatusCode::FORBIDDEN, "Access denied").into_response(),
            Self::ProviderFailure => {
                (StatusCode::BAD_GATEWAY, "Identity provider error").into_response()
            }
            Self::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request").into_response(),
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
