// In-memory implementations of the storage traits.
//
// Used by the HTTP test suite and for running the service locally without
// Postgres. Observable semantics match the Postgres stores: expired
// sessions are filtered at read time, and the counter upsert is atomic per
// bucket (the write lock spans the whole read-modify-write).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{RateLimitCounter, Session, Tenant};
use crate::database::StoreError;

use super::{RateLimitStore, SessionStore, TenantStore};

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get_valid(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        Ok(sessions.get(token).filter(|s| s.is_valid(now)).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        Ok(())
    }

    async fn delete_for_tenant(&self, tenant_id: Uuid) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.tenant_id != tenant_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| s.is_valid(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Clone, Default)]
pub struct MemoryTenantStore {
    tenants: Arc<RwLock<HashMap<Uuid, Tenant>>>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Tenant, StoreError> {
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let mut tenants = self.tenants.write().await;
        tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(&id)
            .filter(|t| t.deleted_at.is_none())
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .values()
            .find(|t| t.email == email && t.deleted_at.is_none())
            .cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tenants = self.tenants.write().await;
        if let Some(tenant) = tenants.get_mut(&id) {
            let now = Utc::now();
            tenant.deleted_at = Some(now);
            tenant.updated_at = now;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryRateLimitStore {
    counters: Arc<RwLock<HashMap<String, RateLimitCounter>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(
        &self,
        bucket: &str,
        window: Duration,
    ) -> Result<RateLimitCounter, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Utc::now();

        let counter = match counters.get_mut(bucket) {
            Some(existing) if existing.expires_at > now => {
                existing.count += 1;
                existing.clone()
            }
            // Absent, or the stored window has elapsed: start a fresh one
            _ => {
                let fresh = RateLimitCounter {
                    bucket: bucket.to_string(),
                    count: 1,
                    expires_at: now + window,
                };
                counters.insert(bucket.to_string(), fresh.clone());
                fresh
            }
        };

        Ok(counter)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Utc::now();
        let before = counters.len();
        counters.retain(|_, c| c.expires_at > now);
        Ok((before - counters.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_session_is_filtered_not_removed() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store
            .insert(Session {
                token: "stale".to_string(),
                tenant_id: Uuid::new_v4(),
                created_at: now - Duration::days(31),
                expires_at: now - Duration::days(1),
            })
            .await
            .unwrap();

        // The row is still present but never resolves
        assert!(store.get_valid("stale").await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemorySessionStore::new();
        store.delete("never-existed").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn delete_for_tenant_leaves_other_sessions() {
        let store = MemorySessionStore::new();
        let doomed = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = Utc::now();
        for (token, tenant_id) in [("a", doomed), ("b", doomed), ("c", other)] {
            store
                .insert(Session {
                    token: token.to_string(),
                    tenant_id,
                    created_at: now,
                    expires_at: now + Duration::days(30),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.delete_for_tenant(doomed).await.unwrap(), 2);
        assert!(store.get_valid("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn increment_starts_fresh_window_after_expiry() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::milliseconds(50);

        for expected in 1..=3 {
            let counter = store.increment("1.2.3.4:login", window).await.unwrap();
            assert_eq!(counter.count, expected);
        }

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        let counter = store.increment("1.2.3.4:login", window).await.unwrap();
        assert_eq!(counter.count, 1, "elapsed window must reset the count");
    }

    #[tokio::test]
    async fn concurrent_increments_lose_nothing() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let window = Duration::seconds(60);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment("shared:checkout", window).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let counter = store.increment("shared:checkout", window).await.unwrap();
        assert_eq!(counter.count, 51);
    }
}
