//! The normalized user profile produced by identity resolution.
//!
//! A profile is built once per session, stored, and afterwards only ever
//! replaced as a whole. It carries the tenant label used to bind the
//! request's `TenantContext`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute key for the provider-issued identifier.
pub const ATTR_UNIQUE_IDENTIFIER: &str = "userUniqueIdentifier";
/// Attribute key for the user id.
pub const ATTR_USER_ID: &str = "userId";
/// Attribute key for the display name.
pub const ATTR_USER_NAME: &str = "username";
/// Attribute key for the email address.
pub const ATTR_EMAIL: &str = "email";
/// Attribute key for the singular role field.
pub const ATTR_ROLE: &str = "role";

/// A resolved user identity with roles and tenant membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-issued token or username; the stable identity key.
    unique_identifier: String,
    user_id: String,
    user_name: String,
    /// Tenant label. Holds the configured default unless roles were found
    /// nested under a specific organization.
    organization: String,
    /// Roles in discovery order.
    roles: Vec<String>,
    is_superadmin: bool,
    attributes: BTreeMap<String, String>,
    /// When the profile was resolved.
    resolved_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a profile with no roles and no attributes.
    #[must_use]
    pub fn new(
        unique_identifier: String,
        user_id: String,
        user_name: String,
        organization: String,
    ) -> Self {
        Self {
            unique_identifier,
            user_id,
            user_name,
            organization,
            roles: Vec::new(),
            is_superadmin: false,
            attributes: BTreeMap::new(),
            resolved_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn unique_identifier(&self) -> &str {
        &self.unique_identifier
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns the tenant label.
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn is_superadmin(&self) -> bool {
        self.is_superadmin
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    pub fn set_organization(&mut self, organization: String) {
        self.organization = organization;
    }

    pub fn set_roles(&mut self, roles: Vec<String>) {
        self.roles = roles;
    }

    pub fn set_superadmin(&mut self, is_superadmin: bool) {
        self.is_superadmin = is_superadmin;
    }

    pub fn insert_attribute(&mut self, key: &str, value: String) {
        self.attributes.insert(key.to_string(), value);
    }
}
