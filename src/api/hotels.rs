//! `/api/hotels` endpoints

use crate::api::common::{paginate, require_id, require_text, PageQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::routes::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::Hotel;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/hotels", get(list_hotels).post(create_hotel))
        .route(
            "/api/hotels/:id",
            get(get_hotel).put(update_hotel).delete(delete_hotel),
        )
}

fn validate_hotel(hotel: &Hotel) -> ApiResult<()> {
    require_text(&hotel.name, "Hotel name is required")?;
    require_text(&hotel.address, "Hotel address is required")?;
    if let Some(rating) = hotel.star_rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(ApiError::validation("Star rating must be between 0 and 5"));
        }
    }
    Ok(())
}

fn load_hotel(state: &AppState, id: i64) -> ApiResult<Hotel> {
    require_id(id, "hotel")?;
    state
        .db
        .get_hotel(id)?
        .ok_or_else(|| ApiError::not_found("Hotel not found"))
}

async fn list_hotels(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Value>> {
    let hotels = state.db.list_hotels(query.search())?;
    paginate("hotels", hotels, &query)
}

async fn create_hotel(
    State(state): State<AppState>,
    ApiJson(hotel): ApiJson<Hotel>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_hotel(&hotel)?;
    let stored = state.db.insert_hotel(&hotel)?;
    info!(hotel_id = stored.id, name = %stored.name, "🏨 Hotel added");

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Hotel added successfully", "hotel": stored})),
    ))
}

async fn get_hotel(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let hotel = load_hotel(&state, id)?;
    Ok(Json(json!({ "hotel": hotel })))
}

async fn update_hotel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(hotel): ApiJson<Hotel>,
) -> ApiResult<Json<Value>> {
    load_hotel(&state, id)?;
    validate_hotel(&hotel)?;

    if !state.db.update_hotel(id, &hotel)? {
        return Err(ApiError::not_found("Hotel not found"));
    }
    let updated = load_hotel(&state, id)?;

    Ok(Json(json!({"message": "Hotel updated successfully", "hotel": updated})))
}

async fn delete_hotel(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    load_hotel(&state, id)?;
    state.db.deactivate_hotel(id)?;
    info!(hotel_id = id, "Hotel deactivated");

    Ok(Json(json!({"message": "Hotel deleted successfully"})))
}
