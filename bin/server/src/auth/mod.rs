//! Authentication module for the profile-gate server.
//!
//! This module provides:
//! - The identity provider clients (`userinfo`, `password`)
//! - SSO proxy and password decryption collaborators
//! - The profile filter middleware that authenticates every request and
//!   binds its tenant, plus extractors for downstream handlers
//! - Auth routes for the failure view, logout and profile lookup

pub mod decrypt;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod routes;
pub mod sso;
pub mod userinfo;

use std::sync::Arc;

use profile_gate_identity::{PasswordDecrypter, ProfileResolver, SessionStore};
use rootcause::prelude::Report;

use crate::config::{AuthConfig, ServerConfig, SessionConfig};
use crate::error::StartupError;

pub use decrypt::Base64Decrypter;
pub use middleware::{AuthRejection, CurrentProfile, CurrentTenant, OptionalProfile};
pub use password::PasswordGrantClient;
pub use resolver::ProviderResolver;
pub use routes::{logout, me, silent_login_failed};
pub use sso::{HeaderSsoProxy, SsoProxy};
pub use userinfo::UserInfoClient;

/// Shared application state.
pub struct AppState {
    /// Session containers and their cached profiles.
    pub sessions: SessionStore,
    /// Resolves profiles against the identity provider.
    pub resolver: Arc<dyn ProfileResolver>,
    /// Reads identifiers forwarded by the SSO proxy.
    pub sso: Arc<dyn SsoProxy>,
    /// Decrypts passwords sent with `passwordMode=encrypted`.
    pub decrypter: Arc<dyn PasswordDecrypter>,
    /// Authentication entry configuration.
    pub auth_config: AuthConfig,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        resolver: Arc<dyn ProfileResolver>,
        sso: Arc<dyn SsoProxy>,
        decrypter: Arc<dyn PasswordDecrypter>,
        auth_config: AuthConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            sessions: SessionStore::new(session_config.duration()),
            resolver,
            sso,
            decrypter,
            auth_config,
            session_config,
        }
    }

    /// Builds the provider-backed collaborators from configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, Report<StartupError>> {
        let provider = Arc::new(config.provider.clone());

        let user_info =
            UserInfoClient::new(provider.clone()).map_err(|e| StartupError::ProviderClient {
                details: e.to_string(),
            })?;
        let password_grant = PasswordGrantClient::from_config(&provider).map_err(|e| {
            StartupError::ProviderClient {
                details: e.to_string(),
            }
        })?;
        if password_grant.is_none() {
            tracing::info!("no token endpoint configured; direct credential logins will fail");
        }

        let sso = HeaderSsoProxy::new(&config.auth.sso_header).map_err(|e| {
            StartupError::InvalidSsoHeader {
                header: config.auth.sso_header.clone(),
                details: e.to_string(),
            }
        })?;

        Ok(Self::new(
            Arc::new(ProviderResolver::new(user_info, password_grant)),
            Arc::new(sso),
            Arc::new(Base64Decrypter),
            config.auth.clone(),
            config.session.clone(),
        ))
    }
}
