//! Identity provider user-info client.

use std::sync::Arc;

use profile_gate_identity::{AuthenticationError, ProviderConfig, ProviderDocument};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use rootcause::prelude::Report;
use tracing::instrument;

/// Fetches user-info documents from the configured provider endpoint.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    http: reqwest::Client,
    config: Arc<ProviderConfig>,
}

impl UserInfoClient {
    /// Creates a client whose requests time out after the configured period.
    pub fn new(config: Arc<ProviderConfig>) -> Result<Self, Report<AuthenticationError>> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthenticationError::ProviderUnavailable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Fetches the user-info document for an access token.
    ///
    /// The token is sent both as the `access_token` query parameter and in
    /// the `Authorization` header. Only a `200` response is accepted.
    #[instrument(skip(self, token), fields(url = %self.config.user_info_url()))]
    pub async fn fetch_user_info(
        &self,
        token: &str,
    ) -> Result<ProviderDocument, Report<AuthenticationError>> {
        let response = self
            .http
            .get(self.config.user_info_url())
            .query(&[("access_token", token)])
            .header(
                AUTHORIZATION,
                format!("{} {}", self.config.authorization_type(), token),
            )
            .send()
            .await
            .map_err(|e| AuthenticationError::ProviderUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.bytes().await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read rejection body");
                    String::new()
                }
            };
            tracing::warn!(status = status.as_u16(), %body, "user info request rejected");
            return Err(AuthenticationError::ProviderRejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthenticationError::ProviderUnavailable {
                reason: format!("failed to read response body: {e}"),
            })?;

        let document = ProviderDocument::from_slice(&body)?;
        tracing::debug!(fields = document.fields().len(), "fetched user info");
        Ok(document)
    }
}
