//! SSO proxy collaborators.
//!
//! When identity is delegated, an upstream proxy authenticates the user and
//! forwards the provider access token with the request. The pipeline only
//! needs the identifier; how the proxy carries it is up to the implementation.

use axum::http::HeaderMap;
use axum::http::header::{HeaderName, InvalidHeaderName};

/// Reads the user identifier an SSO proxy attached to a request.
pub trait SsoProxy: Send + Sync {
    /// Returns the identifier, or `None` if the request carries none.
    fn read_user_identifier(&self, headers: &HeaderMap) -> Option<String>;
}

/// Reads the identifier from a fixed request header.
#[derive(Debug, Clone)]
pub struct HeaderSsoProxy {
    header: HeaderName,
}

impl HeaderSsoProxy {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::try_from(header)?,
        })
    }
}

impl SsoProxy for HeaderSsoProxy {
    fn read_user_identifier(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(&self.header)?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}
