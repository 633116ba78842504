//! Authentication API Endpoints
//! Login, registration, token validation and logout under `/api/auth`

use crate::auth::{
    middleware::bearer_token,
    models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    service::AuthService,
};
use crate::api::extract::ApiJson;
use crate::error::{ApiError, AuthError};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

pub fn router(auth: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/validate", post(validate))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/register", post(register))
        .with_state(auth)
}

/// bcrypt is CPU-bound; keep it off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::StoreFailure(anyhow::anyhow!("auth task failed: {}", e)))?
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.trim().is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let response = run_blocking(move || auth.login(&payload)).await?;
    Ok(Json(response))
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let response = run_blocking(move || auth.register(&payload)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Validate endpoint - POST /api/auth/validate
pub async fn validate(State(auth): State<Arc<AuthService>>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "message": "Invalid authorization header"})),
        )
            .into_response();
    };

    let verified = auth
        .username_from_token(token)
        .filter(|username| auth.validate_token(token, username))
        .zip(auth.role_from_token(token));

    match verified {
        Some((username, role)) => Json(json!({
            "valid": true,
            "username": username,
            "role": role,
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"valid": false, "message": "Invalid or expired token"})),
        )
            .into_response(),
    }
}

/// Logout endpoint - POST /api/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<serde_json::Value> {
    Json(json!({"message": "Logout successful"}))
}
