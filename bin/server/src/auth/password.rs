//! Resource-owner password grant against the provider's token endpoint.

use oauth2::basic::BasicClient;
use oauth2::{
    ClientId, ClientSecret, RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername,
    TokenResponse, TokenUrl,
};
use profile_gate_identity::{AuthenticationError, Credentials, ProviderConfig};
use rootcause::prelude::Report;
use tracing::instrument;

/// Exchanges usernames and passwords for provider access tokens.
#[derive(Debug, Clone)]
pub struct PasswordGrantClient {
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    token_url: TokenUrl,
    http: reqwest::Client,
}

impl PasswordGrantClient {
    /// Creates a client from the provider configuration.
    ///
    /// Returns `None` when no token endpoint or client id is configured.
    pub fn from_config(
        config: &ProviderConfig,
    ) -> Result<Option<Self>, Report<AuthenticationError>> {
        let (Some(token_url), Some(client_id)) = (config.token_url(), config.client_id()) else {
            return Ok(None);
        };

        let token_url = TokenUrl::new(token_url.to_string()).map_err(|e| {
            AuthenticationError::ProviderUnavailable {
                reason: format!("invalid token URL: {e}"),
            }
        })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthenticationError::ProviderUnavailable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Some(Self {
            client_id: ClientId::new(client_id.to_string()),
            client_secret: config
                .client_secret()
                .map(|secret| ClientSecret::new(secret.to_string())),
            token_url,
            http,
        }))
    }

    /// Performs the password grant and returns the access token.
    ///
    /// OAuth2 error responses carry no status through the token client and
    /// are reported as `ProviderRejected` with status 400.
    #[instrument(skip(self, credentials), fields(user = credentials.username()))]
    pub async fn exchange(
        &self,
        credentials: &Credentials,
    ) -> Result<String, Report<AuthenticationError>> {
        let client = BasicClient::new(self.client_id.clone()).set_token_uri(self.token_url.clone());
        let client = match &self.client_secret {
            Some(secret) => client.set_client_secret(secret.clone()),
            None => client,
        };

        let username = ResourceOwnerUsername::new(credentials.username().to_string());
        let password = ResourceOwnerPassword::new(credentials.password().to_string());

        let response = client
            .exchange_password(&username, &password)
            .request_async(&self.http)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => {
                    AuthenticationError::ProviderRejected {
                        status: 400,
                        body: serde_json::to_string(&response)
                            .unwrap_or_else(|_| response.to_string()),
                    }
                }
                RequestTokenError::Request(e) => AuthenticationError::ProviderUnavailable {
                    reason: e.to_string(),
                },
                RequestTokenError::Parse(e, body) => AuthenticationError::MalformedResponse {
                    reason: e.to_string(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                },
                RequestTokenError::Other(reason) => {
                    AuthenticationError::ProviderUnavailable { reason }
                }
            })?;

        tracing::debug!("password grant succeeded");
        Ok(response.access_token().secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, method, path},
    };

    fn config(server: &MockServer) -> ProviderConfig {
        ProviderConfig::builder(format!("{}/user", server.uri()))
            .token_endpoint(
                format!("{}/token", server.uri()),
                "profile-gate".to_string(),
                Some("s3cret".to_string()),
            )
            .build()
    }

    fn alice() -> Credentials {
        Credentials::new("alice".to_string(), "pw".to_string())
    }

    #[test]
    fn absent_without_token_endpoint() {
        let config = ProviderConfig::new("https://idm.example.com/user".to_string());
        assert!(
            PasswordGrantClient::from_config(&config)
                .expect("config")
                .is_none()
        );
    }

    #[tokio::test]
    async fn exchanges_password_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("password=pw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-alice",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PasswordGrantClient::from_config(&config(&server))
            .expect("config")
            .expect("client");

        assert_eq!(client.exchange(&alice()).await.expect("token"), "tok-alice");
    }

    #[tokio::test]
    async fn invalid_grant_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "bad credentials"
            })))
            .mount(&server)
            .await;

        let client = PasswordGrantClient::from_config(&config(&server))
            .expect("config")
            .expect("client");
        let report = client.exchange(&alice()).await.expect_err("rejected");

        match report.current_context() {
            AuthenticationError::ProviderRejected { status, body } => {
                assert_eq!(*status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_token_response_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"unexpected\": true}"),
            )
            .mount(&server)
            .await;

        let client = PasswordGrantClient::from_config(&config(&server))
            .expect("config")
            .expect("client");
        let report = client.exchange(&alice()).await.expect_err("malformed");

        assert!(matches!(
            report.current_context(),
            AuthenticationError::MalformedResponse { .. }
        ));
    }
}
