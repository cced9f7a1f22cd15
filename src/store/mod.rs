// Storage traits - the seam between the core services and the backing store.
//
// All shared state lives behind these traits; the services themselves hold
// no mutable state. Concurrency correctness for the rate limiter rests on
// `RateLimitStore::increment` being atomic per bucket.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::database::models::{RateLimitCounter, Session, Tenant};
use crate::database::StoreError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session row.
    async fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Exact-token lookup, filtering expired rows at read time.
    async fn get_valid(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Unconditional delete; removing a nonexistent row is not an error.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;

    /// Delete every session owned by a tenant (account-deletion cascade).
    async fn delete_for_tenant(&self, tenant_id: Uuid) -> Result<u64, StoreError>;

    /// Physically remove rows past expiry. Validity never depends on this.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Tenant, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Tenant>, StoreError>;

    /// Soft delete; the tenant stops resolving but the row survives.
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically increment the counter for `bucket`.
    ///
    /// Creates the row with `count = 1` and `expires_at = now + window` when
    /// absent, and likewise starts a fresh window when the stored window has
    /// already elapsed. Otherwise increments in place, leaving the window
    /// expiry untouched. Returns the resulting counter.
    async fn increment(
        &self,
        bucket: &str,
        window: Duration,
    ) -> Result<RateLimitCounter, StoreError>;

    /// Physically remove counters whose window has elapsed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}
