//! Provider-backed profile resolution.

use async_trait::async_trait;
use profile_gate_identity::{
    AuthenticationError, Credentials, ProfileBuilder, ProfileResolver, UserProfile,
};
use rootcause::prelude::Report;

use super::password::PasswordGrantClient;
use super::userinfo::UserInfoClient;

/// Resolves profiles by calling the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderResolver {
    user_info: UserInfoClient,
    password_grant: Option<PasswordGrantClient>,
}

impl ProviderResolver {
    #[must_use]
    pub fn new(user_info: UserInfoClient, password_grant: Option<PasswordGrantClient>) -> Self {
        Self {
            user_info,
            password_grant,
        }
    }
}

#[async_trait]
impl ProfileResolver for ProviderResolver {
    async fn resolve_token(
        &self,
        token: &str,
        remote_addr: &str,
    ) -> Result<UserProfile, Report<AuthenticationError>> {
        let document = self.user_info.fetch_user_info(token).await?;
        ProfileBuilder::new(self.user_info.config()).build(&document, token, remote_addr)
    }

    async fn exchange_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<String, Report<AuthenticationError>> {
        match &self.password_grant {
            Some(client) => client.exchange(credentials).await,
            None => Err(AuthenticationError::ProviderUnavailable {
                reason: "no token endpoint configured".to_string(),
            }
            .into()),
        }
    }
}
