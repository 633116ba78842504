//! `/api/users` endpoints (administrators only)

use crate::api::common::{listing, require_id};
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::routes::AppState;
use crate::auth::models::{User, UserUpdate};
use crate::error::{ApiError, ApiResult};
use crate::models::is_valid_email;
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/by-username/:username", get(user_by_username))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(deactivate_user),
        )
}

fn load_user(state: &AppState, id: i64) -> ApiResult<User> {
    require_id(id, "user")?;
    state
        .db
        .get_user(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    listing("users", state.db.list_active_users()?)
}

async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let user = load_user(&state, id)?;
    Ok(Json(json!({ "user": user })))
}

async fn user_by_username(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<User>> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    state
        .db
        .find_user_by_username(username)?
        .filter(|user| user.is_active)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<Value>> {
    let existing = load_user(&state, id)?;

    if let Some(email) = update.email.as_deref().map(str::trim) {
        if !is_valid_email(email) {
            return Err(ApiError::validation("Invalid email format"));
        }
        let taken = state
            .db
            .find_user_by_email(email)?
            .is_some_and(|other| other.id != existing.id);
        if taken {
            return Err(ApiError::validation("Email already exists"));
        }
    }

    if !state.db.update_user_profile(id, &update)? {
        return Err(ApiError::not_found("User not found"));
    }
    let updated = load_user(&state, id)?;
    info!(user_id = id, role = updated.role.as_str(), "👤 User profile updated");

    Ok(Json(json!({"message": "User updated successfully", "user": updated})))
}

async fn deactivate_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    load_user(&state, id)?;
    state.db.deactivate_user(id)?;
    info!(user_id = id, "User deactivated");

    Ok(Json(json!({"message": "User deactivated successfully"})))
}
