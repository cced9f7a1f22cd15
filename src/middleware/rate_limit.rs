use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RateLimitOutcome;

/// Per-route rate limit policy; paired with the app state when the layer
/// is attached in the router.
#[derive(Clone, Debug)]
pub struct RateLimitPolicy {
    pub endpoint: &'static str,
    pub limit: u64,
    pub window_secs: u64,
}

/// Guard a route with a fixed-window limit keyed by client identity.
///
/// The counter is incremented before the handler runs; an over-limit
/// client gets a 429 with Retry-After and the handler never executes.
pub async fn rate_limit_middleware(
    State((state, policy)): State<(AppState, RateLimitPolicy)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !crate::config::config().api.enable_rate_limiting {
        return Ok(next.run(request).await);
    }

    let client = client_identity(request.headers(), &request);

    let outcome = state
        .limiter
        .check(&client, policy.endpoint, policy.limit, policy.window_secs)
        .await?;

    match outcome {
        RateLimitOutcome::Allowed { .. } => Ok(next.run(request).await),
        RateLimitOutcome::Exceeded { retry_after_secs } => {
            warn!(
                client = %client,
                endpoint = policy.endpoint,
                "Request rejected by rate limit"
            );
            Err(ApiError::too_many_requests(
                "Rate limit exceeded",
                retry_after_secs,
            ))
        }
    }
}

/// Client identity for the counter key: first hop of X-Forwarded-For when
/// present (the service runs behind a proxy in production), else the peer
/// address.
fn client_identity(headers: &HeaderMap, request: &Request) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return first_hop.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
