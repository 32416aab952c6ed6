//! Authentication entry points and profile resolution.
//!
//! Every request reaches identity resolution through exactly one
//! `AuthEntry`: a profile already stored in its session, credentials
//! submitted with the request, or an identifier handed over by an SSO
//! proxy. All three converge on `resolve`, so profile construction lives
//! in one place regardless of how the user arrived.

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::AuthenticationError;
use crate::profile::UserProfile;

/// How the deployment is embedded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Standalone web application.
    #[default]
    Web,
    /// Embedded in a portal; identity always comes from the portal's SSO.
    Portlet,
}

/// Where a request without a stored profile looks for an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPath {
    DirectCredentials,
    SsoDelegate,
}

impl EntryPath {
    /// Direct credentials are only accepted by a standalone web deployment
    /// running without SSO.
    #[must_use]
    pub fn select(channel: Channel, sso_enabled: bool) -> Self {
        match (channel, sso_enabled) {
            (Channel::Web, false) => Self::DirectCredentials,
            _ => Self::SsoDelegate,
        }
    }
}

/// The identity a request presented.
#[derive(Debug, Clone)]
pub enum AuthEntry {
    /// The session already holds a resolved profile.
    ExistingSession(Box<UserProfile>),
    /// A username/password pair submitted with the request.
    DirectCredentials(Credentials),
    /// A provider access token read by the SSO proxy.
    SsoToken(String),
}

/// Talks to the identity provider on behalf of `resolve`.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Fetches the user-info document for `token` and builds the profile.
    async fn resolve_token(
        &self,
        token: &str,
        remote_addr: &str,
    ) -> Result<UserProfile, Report<AuthenticationError>>;

    /// Exchanges a username/password pair for an access token.
    async fn exchange_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<String, Report<AuthenticationError>>;
}

/// A profile together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub profile: UserProfile,
    /// True if the provider was contacted, meaning the session must store it.
    pub fresh: bool,
    /// True if the profile came from a direct credential exchange.
    pub silent_login: bool,
}

/// Resolves the profile for an entry.
///
/// An existing session profile is returned unchanged without contacting
/// the provider. Any failure on the direct credential path is reported
/// as `SilentAuthenticationFailed`; SSO failures propagate as they are.
pub async fn resolve(
    entry: AuthEntry,
    resolver: &dyn ProfileResolver,
    remote_addr: &str,
) -> Result<Resolution, Report<AuthenticationError>> {
    match entry {
        AuthEntry::ExistingSession(profile) => Ok(Resolution {
            profile: *profile,
            fresh: false,
            silent_login: false,
        }),
        AuthEntry::DirectCredentials(credentials) => {
            let user = credentials.username().to_string();
            let silent_failure = |report: Report<AuthenticationError>| {
                tracing::error!(user = %user, error = %report, "silent authentication failed");
                report.context(AuthenticationError::SilentAuthenticationFailed {
                    user: user.clone(),
                })
            };

            let token = resolver
                .exchange_credentials(&credentials)
                .await
                .map_err(&silent_failure)?;
            let profile = resolver
                .resolve_token(&token, remote_addr)
                .await
                .map_err(&silent_failure)?;

            tracing::debug!(user = %user, "user authenticated with credentials");
            Ok(Resolution {
                profile,
                fresh: true,
                silent_login: true,
            })
        }
        AuthEntry::SsoToken(token) => {
            let profile = resolver.resolve_token(&token, remote_addr).await?;
            Ok(Resolution {
                profile,
                fresh: true,
                silent_login: false,
            })
        }
    }
}
