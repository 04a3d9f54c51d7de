//! The identity store seam.
//!
//! The store is an external system of record (a user database, a directory
//! service); this crate only ever reads from it, once per authentication
//! attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A reference to a user record in the external identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Primary identifier of the record.
    pub id: String,
    /// Human-facing account name.
    pub username: String,
}

/// Lookup capability over the external identity store.
///
/// Both variants perform exactly one lookup. Implementations must not
/// cache results: a cached resolution can outlive a revoked or altered
/// identity.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find the identity whose `field` equals `value`, without blocking
    /// the calling scheduler.
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Identity>, StoreError>;

    /// Find the identity whose `field` equals `value`, on the calling
    /// thread.
    fn find_by_field_blocking(&self, field: &str, value: &str) -> Result<Option<Identity>, StoreError>;
}

/// An identity store backed by a fixed list of records.
///
/// Intended for tests and for embedders that manage a small closed set of
/// accounts without a database. Supports lookup by the `id` and
/// `username` fields; any other field matches nothing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    users: Vec<Identity>,
}

impl InMemoryStore {
    /// Creates a store over the given records.
    pub fn new(users: Vec<Identity>) -> Self {
        Self { users }
    }

    fn lookup(&self, field: &str, value: &str) -> Option<Identity> {
        self.users
            .iter()
            .find(|user| match field {
                "id" => user.id == value,
                "username" => user.username == value,
                _ => false,
            })
            .cloned()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.lookup(field, value))
    }

    fn find_by_field_blocking(&self, field: &str, value: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.lookup(field, value))
    }
}
