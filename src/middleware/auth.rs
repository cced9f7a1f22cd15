use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::session_token_from_cookie_header;
use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::services::Authentication;

/// Authenticated tenant context, injected into request extensions.
#[derive(Clone, Debug)]
pub struct AuthTenant(pub Tenant);

/// The raw token the session was resolved from; logout revokes it.
#[derive(Clone, Debug)]
pub struct SessionToken(pub String);

/// Session-cookie authentication middleware.
///
/// Resolves the cookie to a tenant and injects it into the request. Every
/// failure mode - missing cookie, unknown token, expired session, deleted
/// tenant, store error - produces the same 401.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_token_from_cookie_header)
        .map(str::to_owned)
        .ok_or_else(not_authenticated)?;

    match state.sessions.resolve_session(&token).await {
        Authentication::Authenticated(tenant) => {
            request.extensions_mut().insert(AuthTenant(tenant));
            request.extensions_mut().insert(SessionToken(token));
            Ok(next.run(request).await)
        }
        Authentication::Unauthenticated => Err(not_authenticated()),
    }
}

fn not_authenticated() -> ApiError {
    ApiError::unauthorized("Not authenticated")
}
