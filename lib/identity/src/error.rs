//! Error types for the identity crate.
//!
//! `AuthenticationError` covers every way identity resolution can fail,
//! from the provider round trip down to origin enforcement. Callers wrap
//! it in a rootcause `Report` at crate boundaries.

use std::fmt;

/// Errors from identity resolution and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The identity provider could not be reached.
    ProviderUnavailable { reason: String },
    /// The identity provider answered with a non-200 status.
    ProviderRejected { status: u16, body: String },
    /// The provider response body was not a JSON object.
    MalformedResponse { reason: String, body: String },
    /// A required field was absent from the provider response.
    MissingField { field: String },
    /// The remote address is outside every allowed range.
    AccessDenied { user: String, address: String },
    /// The provider response could not be turned into a profile.
    ProfileResolutionFailed { reason: String },
    /// Credentials arrived on a request that is not a form submission.
    InvalidMethod { method: String },
    /// The direct credential exchange failed.
    SilentAuthenticationFailed { user: String },
}

impl AuthenticationError {
    /// Returns true if the failure happened talking to the identity provider.
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::ProviderRejected { .. }
                | Self::MalformedResponse { .. }
        )
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
            Self::ProviderRejected { status, .. } => {
                write!(f, "identity provider returned status {status}")
            }
            Self::MalformedResponse { reason, .. } => {
                write!(f, "malformed identity provider response: {reason}")
            }
            Self::MissingField { field } => {
                write!(f, "missing required field: {field}")
            }
            Self::AccessDenied { user, address } => {
                write!(f, "login '{user}' from '{address}' is not allowed")
            }
            Self::ProfileResolutionFailed { reason } => {
                write!(f, "failed to resolve user profile: {reason}")
            }
            Self::InvalidMethod { method } => {
                write!(f, "credentials submitted with method {method}, expected POST")
            }
            Self::SilentAuthenticationFailed { user } => {
                write!(f, "silent authentication failed for '{user}'")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Consumes a failure that must never affect the outcome of a request.
///
/// Used where provider-supplied data is only advisory: the failure is
/// logged and dropped, and the caller continues with `None`.
pub trait Lenient<T> {
    /// Converts the result into an option, logging and discarding the error.
    fn lenient(self, check: &'static str) -> Option<T>;
}

impl<T> Lenient<T> for Result<T, AuthenticationError> {
    fn lenient(self, check: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(check, error = %err, "ignoring lenient check failure");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_rejected_display_omits_body() {
        let err = AuthenticationError::ProviderRejected {
            status: 401,
            body: "secret diagnostics".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(!err.to_string().contains("secret diagnostics"));
    }

    #[test]
    fn access_denied_display() {
        let err = AuthenticationError::AccessDenied {
            user: "alice".to_string(),
            address: "10.0.1.1".to_string(),
        };
        assert!(err.to_string().contains("alice"));
        assert!(err.to_string().contains("10.0.1.1"));
    }

    #[test]
    fn provider_failures_are_classified() {
        assert!(
            AuthenticationError::ProviderUnavailable {
                reason: "refused".to_string()
            }
            .is_provider_failure()
        );
        assert!(
            !AuthenticationError::MissingField {
                field: "id".to_string()
            }
            .is_provider_failure()
        );
    }

    #[test]
    fn lenient_discards_errors() {
        let failed: Result<u8, AuthenticationError> = Err(AuthenticationError::MissingField {
            field: "role".to_string(),
        });
        assert_eq!(failed.lenient("role"), None);

        let ok: Result<u8, AuthenticationError> = Ok(7);
        assert_eq!(ok.lenient("role"), Some(7));
    }
}
