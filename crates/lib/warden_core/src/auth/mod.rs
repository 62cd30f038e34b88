//! Authentication and session logic.
//!
//! Provides password hashing, token encoding/decoding, and the session flows
//! (login, registration, validation, renewal) shared by `warden_api` and the
//! `warden` CLI.

pub mod config;
pub mod jwt;
pub mod password;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
///
/// Display strings may reach untrusted callers through the HTTP layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong secret or unknown email. The two cases are never distinguished.
    #[error("Invalid credentials")]
    CredentialMismatch,

    #[error("Email already registered")]
    DuplicateIdentity,

    #[error("Missing or malformed authorization header")]
    MissingOrMalformedHeader,

    #[error("Invalid or expired token")]
    TokenInvalidOrExpired,

    #[error("User not found")]
    IdentityNotFound,

    #[error("Identity store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateIdentity,
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => AuthError::Internal(msg),
        }
    }
}
