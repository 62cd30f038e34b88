//! Identity store — the credential database the session flows read from.
//!
//! The core only reads identities by primary key or email and creates them
//! at registration. `PgIdentityStore` is the production backend;
//! `MemoryIdentityStore` backs development runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{Identity, NewIdentity};

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

/// Identity store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt identity record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => StoreError::Corrupt(e.to_string()),
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Read/create access to registered identities.
///
/// Implementations enforce email uniqueness and report collisions as
/// [`StoreError::DuplicateEmail`]. Lookups that find nothing return `Ok(None)`.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError>;

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Cheap reachability check for health endpoints.
    async fn ping(&self) -> Result<(), StoreError>;
}
