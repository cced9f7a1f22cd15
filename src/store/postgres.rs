// Postgres implementations of the storage traits, one store per entity.

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{RateLimitCounter, Session, Tenant};
use crate::database::StoreError;

use super::{RateLimitStore, SessionStore, TenantStore};

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, tenant_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.tenant_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_valid(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, tenant_id, created_at, expires_at
             FROM sessions
             WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_tenant(&self, tenant_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Tenant, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash, created_at, updated_at, deleted_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, email, password_hash, created_at, updated_at, deleted_at
             FROM tenants
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, email, password_hash, created_at, updated_at, deleted_at
             FROM tenants
             WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE tenants SET deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for PgRateLimitStore {
    async fn increment(
        &self,
        bucket: &str,
        window: Duration,
    ) -> Result<RateLimitCounter, StoreError> {
        // Single upsert statement: atomic per bucket, which is the only
        // guarantee the limiter needs under concurrent callers. An elapsed
        // window resets in the same write rather than waiting for the sweep.
        let counter = sqlx::query_as::<_, RateLimitCounter>(
            "INSERT INTO rate_limit_counters (bucket, count, expires_at)
             VALUES ($1, 1, now() + make_interval(secs => $2))
             ON CONFLICT (bucket) DO UPDATE SET
                 count = CASE WHEN rate_limit_counters.expires_at <= now()
                              THEN 1
                              ELSE rate_limit_counters.count + 1 END,
                 expires_at = CASE WHEN rate_limit_counters.expires_at <= now()
                              THEN now() + make_interval(secs => $2)
                              ELSE rate_limit_counters.expires_at END
             RETURNING bucket, count, expires_at",
        )
        .bind(bucket)
        .bind(window.num_milliseconds() as f64 / 1000.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(counter)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM rate_limit_counters WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
