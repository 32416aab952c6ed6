//! Builds a `UserProfile` from a provider user-info document.
//!
//! Steps run in a fixed order: identity fields, email and superadmin flag,
//! role extraction, organization fallback, origin enforcement, default
//! role, attributes. Only the identity fields, a malformed top-level role
//! list and the static `allowed_ip` check can fail the build.

use rootcause::Report;

use crate::cidr;
use crate::document::ProviderDocument;
use crate::error::{AuthenticationError, Lenient};
use crate::profile::{
    ATTR_EMAIL, ATTR_ROLE, ATTR_UNIQUE_IDENTIFIER, ATTR_USER_ID, ATTR_USER_NAME, UserProfile,
};
use crate::provider::ProviderConfig;
use crate::role;

/// Field holding the nested organization list.
const ORGANIZATIONS_KEY: &str = "organizations";

/// Maps provider documents to profiles using one provider configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProfileBuilder<'a> {
    config: &'a ProviderConfig,
}

impl<'a> ProfileBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a ProviderConfig) -> Self {
        Self { config }
    }

    /// Builds the profile for `unique_identifier` connecting from `remote_addr`.
    ///
    /// # Errors
    ///
    /// `MissingField` when the id, name or email field is absent,
    /// `ProfileResolutionFailed` when a field has the wrong shape, and
    /// `AccessDenied` when the static range check rejects `remote_addr`.
    pub fn build(
        &self,
        document: &ProviderDocument,
        unique_identifier: &str,
        remote_addr: &str,
    ) -> Result<UserProfile, Report<AuthenticationError>> {
        let config = self.config;

        let user_id = document.required_str(config.id_key())?;
        let user_name = document.required_str(config.name_key())?;
        tracing::debug!(user_id = %user_id, user_name = %user_name, "read identity fields");

        let mut profile = UserProfile::new(
            unique_identifier.to_string(),
            user_id.clone(),
            user_name.clone(),
            config.default_organization().to_string(),
        );

        let email = document.required_str(config.email_key())?;
        profile.set_superadmin(
            config
                .admin_email()
                .is_some_and(|admin| admin.to_lowercase() == email.to_lowercase()),
        );

        let mut roles = self.top_level_roles(document)?;

        if roles.is_empty() {
            let found = document
                .optional_array(ORGANIZATIONS_KEY)
                .lenient("organizations")
                .flatten()
                .and_then(role::first_organization_with_roles);
            if let Some(found) = found {
                tracing::debug!(organization = %found.organization, "roles found in organization");
                profile.set_organization(found.organization);
                roles = found.roles;
            }
        }

        if let Some(allowed) = config.allowed_ip() {
            cidr::check_access(remote_addr, &user_name, cidr::split_ranges(allowed))?;
        }

        if let Some(key) = config.allowed_ip_key() {
            // Provider-supplied ranges are advisory and never deny.
            let _ = document
                .required_str(key)
                .and_then(|ranges| {
                    cidr::check_access(remote_addr, &user_name, cidr::split_ranges(&ranges))
                })
                .lenient("provider allowed ip");
        }

        if roles.is_empty() {
            roles.push(config.default_role().to_string());
        }
        profile.set_roles(roles);

        profile.insert_attribute(ATTR_UNIQUE_IDENTIFIER, unique_identifier.to_string());
        profile.insert_attribute(ATTR_USER_ID, user_id);
        profile.insert_attribute(ATTR_USER_NAME, user_name);
        profile.insert_attribute(ATTR_EMAIL, email);
        if let Some(role) = document.required_str(config.role_key()).lenient("role") {
            profile.insert_attribute(ATTR_ROLE, role);
        }

        tracing::debug!(
            user_id = profile.user_id(),
            organization = profile.organization(),
            roles = ?profile.roles(),
            superadmin = profile.is_superadmin(),
            "built user profile"
        );

        Ok(profile)
    }

    fn top_level_roles(
        &self,
        document: &ProviderDocument,
    ) -> Result<Vec<String>, AuthenticationError> {
        let key = self.config.roles_key();

        if self.config.parse_roles_as_delimited_string() {
            return Ok(document
                .optional_str(key)
                .map(|value| role::split_delimited(&value, self.config.roles_delimiter()))
                .unwrap_or_default());
        }

        match document.optional_array(key)? {
            Some(entries) => role::names_from_role_objects(entries),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const URL: &str = "https://idm.example.com/user";

    fn document(value: Value) -> ProviderDocument {
        ProviderDocument::from_value(value).expect("object")
    }

    fn build(config: &ProviderConfig, value: Value) -> Result<UserProfile, AuthenticationError> {
        ProfileBuilder::new(config)
            .build(&document(value), "token-1", "10.0.0.7")
            .map_err(|report| report.current_context().clone())
    }

    fn alice(roles: Value) -> Value {
        json!({"id": "u1", "displayName": "Alice", "email": "a@x.com", "roles": roles})
    }

    #[test]
    fn end_to_end_with_default_config() {
        let config = ProviderConfig::new(URL.to_string());
        let profile = build(
            &config,
            alice(json!([{"name": "provider"}, {"name": "analyst"}])),
        )
        .expect("profile");

        assert_eq!(profile.roles(), ["analyst".to_string()]);
        assert_eq!(profile.organization(), "SPAGOBI");
        assert!(!profile.is_superadmin());
        assert_eq!(profile.unique_identifier(), "token-1");
        assert_eq!(profile.attribute(ATTR_UNIQUE_IDENTIFIER), Some("token-1"));
        assert_eq!(profile.attribute(ATTR_USER_ID), Some("u1"));
        assert_eq!(profile.attribute(ATTR_USER_NAME), Some("Alice"));
        assert_eq!(profile.attribute(ATTR_EMAIL), Some("a@x.com"));
        assert_eq!(profile.attribute(ATTR_ROLE), None);
    }

    #[test]
    fn superadmin_matches_case_insensitively() {
        let config = ProviderConfig::builder(URL.to_string())
            .admin_email("A@X.COM".to_string())
            .build();
        let profile = build(&config, alice(json!([]))).expect("profile");
        assert!(profile.is_superadmin());

        let config = ProviderConfig::builder(URL.to_string())
            .admin_email("root@x.com".to_string())
            .build();
        let profile = build(&config, alice(json!([]))).expect("profile");
        assert!(!profile.is_superadmin());

        let config = ProviderConfig::builder(URL.to_string())
            .admin_email("ÉLISE@x.com".to_string())
            .build();
        let profile = build(
            &config,
            json!({"id": "u2", "displayName": "Élise", "email": "élise@x.com", "roles": []}),
        )
        .expect("profile");
        assert!(profile.is_superadmin());
    }

    #[test]
    fn missing_identity_fields_fail() {
        let config = ProviderConfig::new(URL.to_string());

        let err = build(&config, json!({"displayName": "Alice", "email": "a@x.com"}))
            .expect_err("missing id");
        assert_eq!(
            err,
            AuthenticationError::MissingField {
                field: "id".to_string()
            }
        );

        let err = build(&config, json!({"id": "u1", "displayName": "Alice"}))
            .expect_err("missing email");
        assert_eq!(
            err,
            AuthenticationError::MissingField {
                field: "email".to_string()
            }
        );
    }

    #[test]
    fn structurally_wrong_identity_field_fails_resolution() {
        let config = ProviderConfig::new(URL.to_string());
        let err = build(
            &config,
            json!({"id": ["u1"], "displayName": "Alice", "email": "a@x.com"}),
        )
        .expect_err("array id");
        assert!(matches!(
            err,
            AuthenticationError::ProfileResolutionFailed { .. }
        ));
    }

    #[test]
    fn configurable_field_keys() {
        let config = ProviderConfig::builder(URL.to_string())
            .id_key("sub".to_string())
            .name_key("name".to_string())
            .email_key("mail".to_string())
            .roles_key("groups".to_string())
            .build();
        let profile = build(
            &config,
            json!({"sub": 7, "name": "Bob", "mail": "b@x.com", "groups": [{"name": "ops"}]}),
        )
        .expect("profile");

        assert_eq!(profile.user_id(), "7");
        assert_eq!(profile.user_name(), "Bob");
        assert_eq!(profile.roles(), ["ops".to_string()]);
    }

    #[test]
    fn delimited_roles_mode() {
        let config = ProviderConfig::builder(URL.to_string())
            .delimited_roles(";".to_string())
            .build();
        let profile = build(&config, alice(json!("admin;;provider;dev"))).expect("profile");

        assert_eq!(
            profile.roles(),
            [
                "admin".to_string(),
                "provider".to_string(),
                "dev".to_string()
            ]
        );
    }

    #[test]
    fn reserved_roles_never_survive_structured_mode() {
        let config = ProviderConfig::new(URL.to_string());
        let profile = build(
            &config,
            alice(json!([{"name": "Provider"}, {"name": "PURCHASER"}, {"name": "x"}])),
        )
        .expect("profile");

        assert!(
            profile
                .roles()
                .iter()
                .all(|r| !r.eq_ignore_ascii_case("provider") && !r.eq_ignore_ascii_case("purchaser"))
        );
        assert_eq!(profile.roles(), ["x".to_string()]);
    }

    #[test]
    fn organization_fallback_uses_first_match_only() {
        let config = ProviderConfig::new(URL.to_string());
        let profile = build(
            &config,
            json!({
                "id": "u1",
                "displayName": "Alice",
                "email": "a@x.com",
                "roles": [{"name": "purchaser"}],
                "organizations": [
                    {"name": "Markers", "roles": [{"name": "provider"}]},
                    {"name": "ACME", "roles": [{"name": "analyst"}]},
                    {"name": "Globex", "roles": [{"name": "admin"}]}
                ]
            }),
        )
        .expect("profile");

        assert_eq!(profile.organization(), "ACME");
        assert_eq!(profile.roles(), ["analyst".to_string()]);
    }

    #[test]
    fn top_level_roles_skip_organizations() {
        let config = ProviderConfig::new(URL.to_string());
        let profile = build(
            &config,
            json!({
                "id": "u1",
                "displayName": "Alice",
                "email": "a@x.com",
                "roles": [{"name": "analyst"}],
                "organizations": [{"name": "ACME", "roles": [{"name": "admin"}]}]
            }),
        )
        .expect("profile");

        assert_eq!(profile.organization(), "SPAGOBI");
        assert_eq!(profile.roles(), ["analyst".to_string()]);
    }

    #[test]
    fn malformed_organizations_field_is_ignored() {
        let config = ProviderConfig::new(URL.to_string());
        let profile = build(
            &config,
            json!({
                "id": "u1",
                "displayName": "Alice",
                "email": "a@x.com",
                "organizations": "ACME"
            }),
        )
        .expect("profile");

        assert_eq!(profile.organization(), "SPAGOBI");
        assert_eq!(profile.roles(), ["user".to_string()]);
    }

    #[test]
    fn default_role_when_nothing_found() {
        let config = ProviderConfig::builder(URL.to_string())
            .default_role("guest".to_string())
            .build();
        let profile = build(
            &config,
            json!({"id": "u1", "displayName": "Alice", "email": "a@x.com"}),
        )
        .expect("profile");

        assert_eq!(profile.roles(), ["guest".to_string()]);
    }

    #[test]
    fn malformed_role_entries_fail_resolution() {
        let config = ProviderConfig::new(URL.to_string());
        let err = build(&config, alice(json!([{"title": "analyst"}]))).expect_err("nameless");
        assert!(matches!(
            err,
            AuthenticationError::ProfileResolutionFailed { .. }
        ));
    }

    #[test]
    fn singular_role_attribute_when_present() {
        let config = ProviderConfig::new(URL.to_string());
        let mut value = alice(json!([]));
        value["role"] = json!("owner");
        let profile = build(&config, value).expect("profile");
        assert_eq!(profile.attribute(ATTR_ROLE), Some("owner"));

        let mut value = alice(json!([]));
        value["role"] = json!({"nested": true});
        let profile = build(&config, value).expect("lookup failure is swallowed");
        assert_eq!(profile.attribute(ATTR_ROLE), None);
    }

    #[test]
    fn static_allowed_ip_enforces() {
        let config = ProviderConfig::builder(URL.to_string())
            .allowed_ip("192.168.0.0/16, 10.0.0.0/24".to_string())
            .build();
        assert!(build(&config, alice(json!([]))).is_ok());

        let config = ProviderConfig::builder(URL.to_string())
            .allowed_ip("10.0.1.0/24".to_string())
            .build();
        let err = build(&config, alice(json!([]))).expect_err("denied");
        assert_eq!(
            err,
            AuthenticationError::AccessDenied {
                user: "Alice".to_string(),
                address: "10.0.0.7".to_string(),
            }
        );
    }

    #[test]
    fn static_allowed_ip_with_only_garbage_denies() {
        let config = ProviderConfig::builder(URL.to_string())
            .allowed_ip("garbage".to_string())
            .build();
        assert!(matches!(
            build(&config, alice(json!([]))),
            Err(AuthenticationError::AccessDenied { .. })
        ));
    }

    #[test]
    fn provider_allowed_ip_never_denies() {
        let config = ProviderConfig::builder(URL.to_string())
            .allowed_ip_key("allowedIp".to_string())
            .build();

        for ranges in [json!("not-a-cidr"), json!("10.0.1.0/24"), json!(["x"]), Value::Null] {
            let mut value = alice(json!([]));
            value["allowedIp"] = ranges;
            assert!(build(&config, value).is_ok());
        }

        assert!(build(&config, alice(json!([]))).is_ok());
    }

    #[test]
    fn unknown_remote_address_is_denied_by_static_ranges() {
        let config = ProviderConfig::builder(URL.to_string())
            .allowed_ip("0.0.0.0/0".to_string())
            .build();
        let result = ProfileBuilder::new(&config).build(&document(alice(json!([]))), "t", "");
        assert!(result.is_err());
    }
}
