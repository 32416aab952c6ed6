//! profile-gate HTTP server.
//!
//! Hosts the identity pipeline behind axum: every request is authenticated
//! by the profile filter, which resolves the user against the identity
//! provider once per session and binds the user's tenant while the request
//! is handled.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
