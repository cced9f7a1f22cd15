use axum::{
    extract::{Extension, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::clear_session_cookie;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthTenant, SessionToken};

/// GET /api/auth/whoami - Return the authenticated tenant
pub async fn whoami(Extension(AuthTenant(tenant)): Extension<AuthTenant>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": tenant.id,
        "name": tenant.name,
        "email": tenant.email,
        "created_at": tenant.created_at,
    })))
}

/// DELETE /api/auth/session - Revoke the presented session (logout)
///
/// The row is deleted unconditionally and the cookie cleared; logging out
/// twice is fine.
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Response, ApiError> {
    state.sessions.revoke_session(&token).await?;

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        ApiResponse::<()>::no_content(),
    )
        .into_response())
}

/// DELETE /api/auth/account - Soft-delete the tenant and revoke all of
/// its sessions
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(AuthTenant(tenant)): Extension<AuthTenant>,
) -> Result<Response, ApiError> {
    state.tenants.soft_delete(tenant.id).await?;
    let revoked = state.sessions.revoke_tenant_sessions(tenant.id).await?;

    tracing::info!(tenant = %tenant.id, revoked_sessions = revoked, "Account deleted");

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        ApiResponse::<()>::no_content(),
    )
        .into_response())
}
