//! Session lifecycle: issue, resolve, revoke.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::auth::generate_session_token;
use crate::database::models::{Session, Tenant};
use crate::database::StoreError;
use crate::store::{SessionStore, TenantStore};

/// Result of resolving a session token.
///
/// Deliberately a sum type rather than an error: callers never learn
/// whether the token was absent, expired, malformed, or the store failed.
#[derive(Debug)]
pub enum Authentication {
    Authenticated(Tenant),
    Unauthenticated,
}

impl Authentication {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Authenticated(_))
    }
}

pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    tenants: Arc<dyn TenantStore>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        tenants: Arc<dyn TenantStore>,
        ttl_days: i64,
    ) -> Self {
        Self {
            sessions,
            tenants,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Session lifetime in seconds, for the cookie Max-Age.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a session for a tenant and return the opaque token.
    pub async fn create_session(&self, tenant_id: Uuid) -> Result<String, StoreError> {
        let token = generate_session_token();
        let now = Utc::now();
        self.sessions
            .insert(Session {
                token: token.clone(),
                tenant_id,
                created_at: now,
                expires_at: now + self.ttl,
            })
            .await?;
        Ok(token)
    }

    /// Resolve a token to its owning tenant.
    ///
    /// Two sequential lookups (session, then tenant) with no transactional
    /// guarantee; a tenant deleted between the two reads comes back
    /// `Unauthenticated`. Store failures collapse to `Unauthenticated` as
    /// well - this path fails closed and never propagates an error.
    pub async fn resolve_session(&self, token: &str) -> Authentication {
        let session = match self.sessions.get_valid(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return Authentication::Unauthenticated,
            Err(e) => {
                warn!("Session lookup failed, treating as unauthenticated: {}", e);
                return Authentication::Unauthenticated;
            }
        };

        match self.tenants.get_by_id(session.tenant_id).await {
            Ok(Some(tenant)) => Authentication::Authenticated(tenant),
            Ok(None) => Authentication::Unauthenticated,
            Err(e) => {
                warn!("Tenant lookup failed, treating as unauthenticated: {}", e);
                Authentication::Unauthenticated
            }
        }
    }

    /// Delete the session row. Idempotent - revoking an unknown token is
    /// not an error.
    pub async fn revoke_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.delete(token).await
    }

    /// Revoke every session owned by a tenant (account-deletion cascade).
    pub async fn revoke_tenant_sessions(&self, tenant_id: Uuid) -> Result<u64, StoreError> {
        self.sessions.delete_for_tenant(tenant_id).await
    }

    /// Remove rows past expiry; validity never depends on this running.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.sessions.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemorySessionStore, MemoryTenantStore};

    fn service() -> (SessionService, Arc<MemoryTenantStore>) {
        let sessions = Arc::new(MemorySessionStore::new());
        let tenants = Arc::new(MemoryTenantStore::new());
        (
            SessionService::new(sessions, tenants.clone(), 30),
            tenants,
        )
    }

    async fn seed_tenant(tenants: &MemoryTenantStore) -> Tenant {
        tenants
            .create("Acme", "ops@acme.test", "x")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn token_resolves_to_owning_tenant() {
        let (service, tenants) = service();
        let tenant = seed_tenant(&tenants).await;

        let token = service.create_session(tenant.id).await.unwrap();
        assert_eq!(token.len(), 64);

        match service.resolve_session(&token).await {
            Authentication::Authenticated(resolved) => assert_eq!(resolved.id, tenant.id),
            Authentication::Unauthenticated => panic!("fresh session must resolve"),
        }
    }

    #[tokio::test]
    async fn create_resolve_revoke_resolve() {
        let (service, tenants) = service();
        let tenant = seed_tenant(&tenants).await;

        let token = service.create_session(tenant.id).await.unwrap();
        assert!(service.resolve_session(&token).await.is_authenticated());

        service.revoke_session(&token).await.unwrap();
        assert!(!service.resolve_session(&token).await.is_authenticated());

        // Revoking again is fine
        service.revoke_session(&token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_row_does_not_authenticate() {
        let sessions = Arc::new(MemorySessionStore::new());
        let tenants = Arc::new(MemoryTenantStore::new());
        let service = SessionService::new(sessions.clone(), tenants.clone(), 30);
        let tenant = seed_tenant(&tenants).await;

        // Insert a row that is already past expiry but physically present
        let now = Utc::now();
        sessions
            .insert(Session {
                token: "e".repeat(64),
                tenant_id: tenant.id,
                created_at: now - Duration::days(31),
                expires_at: now - Duration::days(1),
            })
            .await
            .unwrap();

        let auth = service.resolve_session(&"e".repeat(64)).await;
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn tenant_deleted_after_issue_does_not_authenticate() {
        let (service, tenants) = service();
        let tenant = seed_tenant(&tenants).await;
        let token = service.create_session(tenant.id).await.unwrap();

        tenants.soft_delete(tenant.id).await.unwrap();

        assert!(!service.resolve_session(&token).await.is_authenticated());
    }

    #[tokio::test]
    async fn unknown_and_garbage_tokens_are_unauthenticated() {
        let (service, _tenants) = service();
        assert!(!service.resolve_session("").await.is_authenticated());
        assert!(!service
            .resolve_session("not-even-hex")
            .await
            .is_authenticated());
    }

    #[tokio::test]
    async fn cascade_revokes_every_tenant_session() {
        let (service, tenants) = service();
        let tenant = seed_tenant(&tenants).await;
        let t1 = service.create_session(tenant.id).await.unwrap();
        let t2 = service.create_session(tenant.id).await.unwrap();

        let revoked = service.revoke_tenant_sessions(tenant.id).await.unwrap();
        assert_eq!(revoked, 2);
        assert!(!service.resolve_session(&t1).await.is_authenticated());
        assert!(!service.resolve_session(&t2).await.is_authenticated());
    }
}
