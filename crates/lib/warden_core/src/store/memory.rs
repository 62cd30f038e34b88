//! In-memory identity store for development and tests.
//!
//! Contents are lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{IdentityStore, StoreError};
use crate::models::auth::{Identity, NewIdentity, Role};

/// Identities keyed by email.
#[derive(Debug)]
pub struct MemoryIdentityStore {
    by_email: DashMap<String, Identity>,
    next_id: AtomicI64,
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            by_email: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Change an identity's role. Returns `false` if no such identity exists.
    pub fn update_role(&self, id: i64, role: Role) -> bool {
        match self.by_email.iter_mut().find(|entry| entry.id == id) {
            Some(mut entry) => {
                entry.role = role;
                true
            }
            None => false,
        }
    }

    /// Remove an identity by id. Returns `false` if no such identity exists.
    pub fn remove(&self, id: i64) -> bool {
        let email = self
            .by_email
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.key().clone());
        match email {
            Some(email) => self.by_email.remove(&email).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.by_email.get(email).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .by_email
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        match self.by_email.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let created = Identity {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    email: identity.email,
                    password_hash: identity.password_hash,
                    display_name: identity.display_name,
                    role: identity.role,
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
