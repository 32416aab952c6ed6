//! Identity resolution and tenant binding for profile-gate.
//!
//! This crate holds the transport-free parts of the authentication pipeline:
//! - CIDR origin checks (`cidr`)
//! - Mapping a provider user-info document to a `UserProfile` (`builder`)
//! - Credential extraction from request parameters (`credentials`)
//! - Session containers and the per-session profile cache (`session`)
//! - Request-scoped tenant binding (`tenant`)
//! - The entry variants every request resolves through (`auth`)
//!
//! # Example
//!
//! ```
//! use profile_gate_identity::{ProfileBuilder, ProviderConfig, ProviderDocument};
//!
//! let config = ProviderConfig::new("https://idm.example.com/user".to_string());
//! let document = ProviderDocument::from_slice(
//!     br#"{"id":"u1","displayName":"Alice","email":"a@x.com",
//!         "roles":[{"name":"provider"},{"name":"analyst"}]}"#,
//! )
//! .expect("valid document");
//!
//! let profile = ProfileBuilder::new(&config)
//!     .build(&document, "token-1", "10.0.0.7")
//!     .expect("profile");
//!
//! assert_eq!(profile.roles(), ["analyst".to_string()]);
//! assert_eq!(profile.organization(), "SPAGOBI");
//! assert!(!profile.is_superadmin());
//! ```

pub mod auth;
pub mod builder;
pub mod cidr;
pub mod credentials;
pub mod document;
pub mod error;
pub mod profile;
pub mod provider;
pub mod role;
pub mod session;
pub mod tenant;

// Re-export main types at crate root
pub use auth::{AuthEntry, Channel, EntryPath, ProfileResolver, Resolution, resolve};
pub use builder::ProfileBuilder;
pub use credentials::{Credentials, DecryptError, PasswordDecrypter};
pub use document::ProviderDocument;
pub use error::{AuthenticationError, Lenient};
pub use profile::UserProfile;
pub use provider::{ProviderConfig, ProviderConfigBuilder};
pub use session::{OpenedSession, SessionState, SessionStore};
pub use tenant::TenantContext;
