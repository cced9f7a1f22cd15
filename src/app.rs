//! Application state and router assembly.
//!
//! Stores are constructed explicitly and handed to the services here; the
//! same router serves production (Postgres) and the test suite (memory).

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::middleware::{rate_limit_middleware, session_auth_middleware, RateLimitPolicy};
use crate::services::{RateLimiter, SessionService};
use crate::store::memory::{MemoryRateLimitStore, MemorySessionStore, MemoryTenantStore};
use crate::store::postgres::{PgRateLimitStore, PgSessionStore, PgTenantStore};
use crate::store::{RateLimitStore, SessionStore, TenantStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub limiter: Arc<RateLimiter>,
    pub tenants: Arc<dyn TenantStore>,
    /// Present only when backed by Postgres; drives the health probe.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Production state: all three stores over one Postgres pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self::assemble(
            Arc::new(PgSessionStore::new(pool.clone())),
            Arc::new(PgTenantStore::new(pool.clone())),
            Arc::new(PgRateLimitStore::new(pool.clone())),
            Some(pool),
        )
    }

    /// In-process state for tests and database-less local runs.
    pub fn memory() -> Self {
        Self::assemble(
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryTenantStore::new()),
            Arc::new(MemoryRateLimitStore::new()),
            None,
        )
    }

    fn assemble(
        sessions: Arc<dyn SessionStore>,
        tenants: Arc<dyn TenantStore>,
        limits: Arc<dyn RateLimitStore>,
        pool: Option<PgPool>,
    ) -> Self {
        let cfg = config();
        Self {
            sessions: Arc::new(SessionService::new(
                sessions,
                tenants.clone(),
                cfg.security.session_ttl_days,
            )),
            limiter: Arc::new(RateLimiter::new(limits)),
            tenants,
            pool,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (rate limited)
        .merge(auth_public_routes(state.clone()))
        // Protected API (session cookie required)
        .merge(auth_routes(state.clone()));

    let router = if config().security.enable_cors {
        router.layer(cors_layer())
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes(state: AppState) -> Router<AppState> {
    use axum::routing::post;
    use crate::handlers::public::auth;

    let cfg = config();
    let login_policy = RateLimitPolicy {
        endpoint: "login",
        limit: cfg.api.login_rate_limit,
        window_secs: cfg.api.login_rate_window_secs,
    };

    Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            (state, login_policy),
            rate_limit_middleware,
        ))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use axum::routing::delete;
    use crate::handlers::protected::auth;

    Router::new()
        // Session management for authenticated tenants
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/session", delete(auth::logout))
        .route("/api/auth/account", delete(auth::delete_account))
        .route_layer(middleware::from_fn_with_state(
            state,
            session_auth_middleware,
        ))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Beacon API",
            "version": version,
            "description": "Multi-tenant session authentication and rate limiting service",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "POST /auth/login (public, rate limited)",
                "whoami": "GET /api/auth/whoami (protected)",
                "logout": "DELETE /api/auth/session (protected)",
                "account": "DELETE /api/auth/account (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match &state.pool {
        Some(pool) => match crate::database::health_check(pool).await {
            Ok(_) => (
                axum::http::StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": {
                        "status": "ok",
                        "timestamp": now,
                        "database": "ok"
                    }
                })),
            ),
            Err(e) => (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            ),
        },
        None => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "memory"
                }
            })),
        ),
    }
}
