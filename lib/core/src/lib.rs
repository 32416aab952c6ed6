//! Core types and utilities shared across profile-gate crates.
//!
//! This crate provides the foundational identifier types and the error
//! handling alias used by the identity pipeline and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{RequestId, SessionId};
