//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`ProviderConfig`](profile_gate_identity::ProviderConfig) for the
//! identity provider settings read from `PROVIDER__*`.

use std::net::SocketAddr;

use profile_gate_identity::{Channel, EntryPath, ProviderConfig};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Identity provider configuration.
    pub provider: ProviderConfig,

    /// Authentication entry configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// How requests without a stored profile are authenticated.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Deployment channel.
    /// Default: web
    #[serde(default)]
    pub channel: Channel,

    /// Whether identity is delegated to an SSO proxy.
    #[serde(default)]
    pub sso_enabled: bool,

    /// Header the SSO proxy places the provider access token in.
    #[serde(default = "default_sso_header")]
    pub sso_header: String,

    /// Where failed silent logins are redirected.
    #[serde(default = "default_failure_path")]
    pub failure_path: String,
}

fn default_sso_header() -> String {
    "x-forwarded-access-token".to_string()
}

fn default_failure_path() -> String {
    "/auth/silent-login-failed".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            sso_enabled: false,
            sso_header: default_sso_header(),
            failure_path: default_failure_path(),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn entry_path(&self) -> EntryPath {
        EntryPath::select(self.channel, self.sso_enabled)
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_session_duration_minutes() -> i64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, config::ConfigError> {
        let source = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_environment(config::Environment::default().source(Some(source)))
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_minutes, 30);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
    }

    #[test]
    fn auth_config_defaults_to_direct_credentials() {
        let config = AuthConfig::default();
        assert_eq!(config.channel, Channel::Web);
        assert!(!config.sso_enabled);
        assert_eq!(config.sso_header, "x-forwarded-access-token");
        assert_eq!(config.failure_path, "/auth/silent-login-failed");
        assert_eq!(config.entry_path(), EntryPath::DirectCredentials);
    }

    #[test]
    fn loads_minimal_environment() {
        let config =
            load(&[("PROVIDER__USER_INFO_URL", "https://idm.example.com/user")]).expect("load");

        assert_eq!(config.listen_addr, default_listen_addr());
        assert_eq!(config.provider.user_info_url(), "https://idm.example.com/user");
        assert_eq!(config.provider.authorization_type(), "Bearer");
        assert_eq!(config.provider.default_organization(), "SPAGOBI");
        assert_eq!(config.session.duration_minutes, 30);
    }

    #[test]
    fn loads_full_environment() {
        let config = load(&[
            ("LISTEN_ADDR", "0.0.0.0:8080"),
            ("PROVIDER__USER_INFO_URL", "https://idm.example.com/user"),
            ("PROVIDER__USER_INFO_PARSE_ROLES", "true"),
            ("PROVIDER__USER_INFO_ROLES_DELIMITER", ";"),
            ("PROVIDER__ADMIN_EMAIL", "root@example.com"),
            ("PROVIDER__ALLOWED_IP", "10.0.0.0/24"),
            ("PROVIDER__REQUEST_TIMEOUT_SECONDS", "5"),
            ("AUTH__CHANNEL", "portlet"),
            ("AUTH__SSO_HEADER", "x-token"),
            ("SESSION__DURATION_MINUTES", "10"),
            ("SESSION__SECURE_COOKIES", "false"),
        ])
        .expect("load");

        assert_eq!(config.listen_addr.port(), 8080);
        assert!(config.provider.parse_roles_as_delimited_string());
        assert_eq!(config.provider.roles_delimiter(), ";");
        assert_eq!(config.provider.admin_email(), Some("root@example.com"));
        assert_eq!(config.provider.allowed_ip(), Some("10.0.0.0/24"));
        assert_eq!(config.provider.request_timeout().as_secs(), 5);
        assert_eq!(config.auth.channel, Channel::Portlet);
        assert_eq!(config.auth.entry_path(), EntryPath::SsoDelegate);
        assert_eq!(config.auth.sso_header, "x-token");
        assert_eq!(config.session.duration_minutes, 10);
        assert!(!config.session.secure_cookies);
    }

    #[test]
    fn missing_user_info_url_fails() {
        assert!(load(&[("SESSION__DURATION_MINUTES", "10")]).is_err());
    }
}
