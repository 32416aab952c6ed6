//! Role extraction from identity provider responses.
//!
//! Providers deliver roles in one of three shapes: a delimited string, a
//! list of role objects, or role lists nested under organizations. The
//! marker roles `provider` and `purchaser` describe marketplace
//! membership rather than authorization and are never kept.

use serde_json::Value;

use crate::error::AuthenticationError;

/// Marker roles dropped from every structured role list.
pub const RESERVED_ROLES: [&str; 2] = ["provider", "purchaser"];

/// Returns true if `name` is a reserved marker role, ignoring case.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_ROLES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Splits a delimited role string, discarding empty tokens.
#[must_use]
pub fn split_delimited(value: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return if value.is_empty() {
            Vec::new()
        } else {
            vec![value.to_string()]
        };
    }

    value
        .split(delimiter)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collects the `name` of every role object, skipping reserved roles.
///
/// Fails if an entry is not an object with a string `name`.
pub fn names_from_role_objects(entries: &[Value]) -> Result<Vec<String>, AuthenticationError> {
    let mut roles = Vec::new();
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
            AuthenticationError::ProfileResolutionFailed {
                reason: format!("role entry without a name: {entry}"),
            }
        })?;

        if !is_reserved(name) {
            roles.push(name.to_string());
        }
    }
    Ok(roles)
}

/// Roles discovered inside one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRoles {
    pub organization: String,
    pub roles: Vec<String>,
}

/// Finds the first organization that grants at least one usable role.
///
/// Organizations are scanned in order and scanning stops at the first
/// hit; roles are never merged across organizations. Malformed entries
/// are skipped.
#[must_use]
pub fn first_organization_with_roles(organizations: &[Value]) -> Option<OrganizationRoles> {
    organizations.iter().find_map(|organization| {
        let name = organization.get("name").and_then(Value::as_str)?;
        let entries = organization.get("roles").and_then(Value::as_array)?;

        let roles: Vec<String> = entries
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .filter(|role| !is_reserved(role))
            .map(str::to_string)
            .collect();

        if roles.is_empty() {
            tracing::debug!(organization = name, "organization grants no usable roles");
            return None;
        }

        Some(OrganizationRoles {
            organization: name.to_string(),
            roles,
        })
    })
}
