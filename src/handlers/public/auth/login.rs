use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::{session_cookie, verify_password};
use crate::error::ApiError;
use crate::middleware::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Authenticate a tenant and issue a session cookie
///
/// Expected Input:
/// ```json
/// {
///   "email": "ops@acme.test",
///   "password": "secret"
/// }
/// ```
///
/// On success the session token is set as an HTTP-only cookie and the
/// response carries the tenant profile plus the session lifetime.
/// Lookup failure and password mismatch produce the same 401 so the
/// response does not reveal which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let tenant = state
        .tenants
        .get_by_email(email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(&payload.password, &tenant.password_hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed: {}", e);
        invalid_credentials()
    })?;
    if !valid {
        return Err(invalid_credentials());
    }

    let token = state.sessions.create_session(tenant.id).await?;
    let max_age = state.sessions.ttl_secs();

    tracing::info!(tenant = %tenant.id, "Login succeeded");

    let body = ApiResponse::success(json!({
        "tenant": {
            "id": tenant.id,
            "name": tenant.name,
            "email": tenant.email,
        },
        "expires_in": max_age,
    }));

    Ok(([(SET_COOKIE, session_cookie(&token, max_age))], body).into_response())
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}
