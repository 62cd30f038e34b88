//! # warden_core
//!
//! Token lifecycle and credential verification for Warden.

pub mod auth;
pub mod clock;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
