//! Domain error types for server start-up.

use std::fmt;

/// Errors raised while assembling the application state.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The configured SSO header is not a valid header name.
    InvalidSsoHeader { header: String, details: String },
    /// An identity provider client could not be built.
    ProviderClient { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::InvalidSsoHeader { header, details } => {
                write!(f, "invalid SSO header '{header}': {details}")
            }
            Self::ProviderClient { details } => {
                write!(f, "failed to build identity provider client: {details}")
            }
        }
    }
}

impl std::error::Error for StartupError {}
