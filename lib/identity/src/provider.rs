//! Identity provider configuration.
//!
//! Describes where the user-info endpoint lives, how to authenticate
//! against it, and which response fields carry identity, roles and
//! origin restrictions. Every field name is configurable because
//! providers disagree on their JSON shape.

use serde::{Deserialize, Serialize};

/// Configuration for the external OAuth2 identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The user-info endpoint queried with the access token.
    user_info_url: String,
    /// Scheme placed before the token in the `Authorization` header.
    /// Default: "Bearer"
    #[serde(default = "default_authorization_type")]
    user_info_authorization_type: String,
    /// Response field holding the user id.
    /// Default: "id"
    #[serde(default = "default_id_key")]
    user_info_id_key: String,
    /// Response field holding the display name.
    /// Default: "displayName"
    #[serde(default = "default_name_key")]
    user_info_name_key: String,
    /// Response field holding the email address.
    /// Default: "email"
    #[serde(default = "default_email_key")]
    user_info_email_key: String,
    /// Response field holding the role list.
    /// Default: "roles"
    #[serde(default = "default_roles_key")]
    user_info_roles_key: String,
    /// Whether the role field is a delimited string rather than a list of objects.
    /// Default: false
    #[serde(default)]
    user_info_parse_roles: bool,
    /// Delimiter used when `user_info_parse_roles` is set.
    /// Default: ","
    #[serde(default = "default_roles_delimiter")]
    user_info_roles_delimiter: String,
    /// Response field holding a single role, copied into the profile attributes.
    /// Default: "role"
    #[serde(default = "default_role_key")]
    user_info_role_key: String,
    /// Email address that marks a user as superadmin.
    #[serde(default)]
    admin_email: Option<String>,
    /// Comma-separated CIDR ranges the remote address must match.
    #[serde(default)]
    allowed_ip: Option<String>,
    /// Response field holding provider-supplied CIDR ranges.
    #[serde(default)]
    user_info_allowed_ip_key: Option<String>,
    /// Role assigned when the response yields none.
    /// Default: "user"
    #[serde(default = "default_role_on_signup")]
    default_role_on_signup: String,
    /// Tenant assigned unless roles are found under a specific organization.
    /// Default: "SPAGOBI"
    #[serde(default = "default_organization")]
    default_organization: String,
    /// OAuth2 token endpoint used to exchange direct credentials.
    #[serde(default)]
    token_url: Option<String>,
    /// OAuth2 client id for the credential exchange.
    #[serde(default)]
    client_id: Option<String>,
    /// OAuth2 client secret for the credential exchange.
    #[serde(default)]
    client_secret: Option<String>,
    /// Timeout applied to every outbound provider call, in seconds.
    /// Default: 30
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
}

fn default_authorization_type() -> String {
    "Bearer".to_string()
}

fn default_id_key() -> String {
    "id".to_string()
}

fn default_name_key() -> String {
    "displayName".to_string()
}

fn default_email_key() -> String {
    "email".to_string()
}

fn default_roles_key() -> String {
    "roles".to_string()
}

fn default_roles_delimiter() -> String {
    ",".to_string()
}

fn default_role_key() -> String {
    "role".to_string()
}

fn default_role_on_signup() -> String {
    "user".to_string()
}

fn default_organization() -> String {
    "SPAGOBI".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl ProviderConfig {
    /// Creates a configuration with defaults for every optional field.
    #[must_use]
    pub fn new(user_info_url: String) -> Self {
        Self {
            user_info_url,
            user_info_authorization_type: default_authorization_type(),
            user_info_id_key: default_id_key(),
            user_info_name_key: default_name_key(),
            user_info_email_key: default_email_key(),
            user_info_roles_key: default_roles_key(),
            user_info_parse_roles: false,
            user_info_roles_delimiter: default_roles_delimiter(),
            user_info_role_key: default_role_key(),
            admin_email: None,
            allowed_ip: None,
            user_info_allowed_ip_key: None,
            default_role_on_signup: default_role_on_signup(),
            default_organization: default_organization(),
            token_url: None,
            client_id: None,
            client_secret: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(user_info_url: String) -> ProviderConfigBuilder {
        ProviderConfigBuilder {
            config: Self::new(user_info_url),
        }
    }

    #[must_use]
    pub fn user_info_url(&self) -> &str {
        &self.user_info_url
    }

    #[must_use]
    pub fn authorization_type(&self) -> &str {
        &self.user_info_authorization_type
    }

    #[must_use]
    pub fn id_key(&self) -> &str {
        &self.user_info_id_key
    }

    #[must_use]
    pub fn name_key(&self) -> &str {
        &self.user_info_name_key
    }

    #[must_use]
    pub fn email_key(&self) -> &str {
        &self.user_info_email_key
    }

    #[must_use]
    pub fn roles_key(&self) -> &str {
        &self.user_info_roles_key
    }

    /// Returns true if roles arrive as one delimited string.
    #[must_use]
    pub fn parse_roles_as_delimited_string(&self) -> bool {
        self.user_info_parse_roles
    }

    #[must_use]
    pub fn roles_delimiter(&self) -> &str {
        &self.user_info_roles_delimiter
    }

    #[must_use]
    pub fn role_key(&self) -> &str {
        &self.user_info_role_key
    }

    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    /// Returns the statically configured CIDR ranges, unsplit.
    #[must_use]
    pub fn allowed_ip(&self) -> Option<&str> {
        self.allowed_ip.as_deref()
    }

    #[must_use]
    pub fn allowed_ip_key(&self) -> Option<&str> {
        self.user_info_allowed_ip_key.as_deref()
    }

    #[must_use]
    pub fn default_role(&self) -> &str {
        &self.default_role_on_signup
    }

    #[must_use]
    pub fn default_organization(&self) -> &str {
        &self.default_organization
    }

    #[must_use]
    pub fn token_url(&self) -> Option<&str> {
        self.token_url.as_deref()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Builder for `ProviderConfig`.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    #[must_use]
    pub fn authorization_type(mut self, value: String) -> Self {
        self.config.user_info_authorization_type = value;
        self
    }

    #[must_use]
    pub fn id_key(mut self, key: String) -> Self {
        self.config.user_info_id_key = key;
        self
    }

    #[must_use]
    pub fn name_key(mut self, key: String) -> Self {
        self.config.user_info_name_key = key;
        self
    }

    #[must_use]
    pub fn email_key(mut self, key: String) -> Self {
        self.config.user_info_email_key = key;
        self
    }

    #[must_use]
    pub fn roles_key(mut self, key: String) -> Self {
        self.config.user_info_roles_key = key;
        self
    }

    /// Switches role parsing to delimited-string mode.
    #[must_use]
    pub fn delimited_roles(mut self, delimiter: String) -> Self {
        self.config.user_info_parse_roles = true;
        self.config.user_info_roles_delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn role_key(mut self, key: String) -> Self {
        self.config.user_info_role_key = key;
        self
    }

    #[must_use]
    pub fn admin_email(mut self, email: String) -> Self {
        self.config.admin_email = Some(email);
        self
    }

    #[must_use]
    pub fn allowed_ip(mut self, ranges: String) -> Self {
        self.config.allowed_ip = Some(ranges);
        self
    }

    #[must_use]
    pub fn allowed_ip_key(mut self, key: String) -> Self {
        self.config.user_info_allowed_ip_key = Some(key);
        self
    }

    #[must_use]
    pub fn default_role(mut self, role: String) -> Self {
        self.config.default_role_on_signup = role;
        self
    }

    #[must_use]
    pub fn default_organization(mut self, organization: String) -> Self {
        self.config.default_organization = organization;
        self
    }

    /// Configures the token endpoint for direct credential exchange.
    #[must_use]
    pub fn token_endpoint(
        mut self,
        token_url: String,
        client_id: String,
        client_secret: Option<String>,
    ) -> Self {
        self.config.token_url = Some(token_url);
        self.config.client_id = Some(client_id);
        self.config.client_secret = client_secret;
        self
    }

    #[must_use]
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.request_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}
