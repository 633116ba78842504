//! `/api/rooms` endpoints, including per-hotel listing and availability

use crate::api::common::{listing, paginate, require_id, require_text, PageQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::routes::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::Room;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/available", get(available_rooms))
        .route("/api/rooms/hotel/:hotel_id", get(rooms_for_hotel))
        .route(
            "/api/rooms/:id",
            get(get_room).put(update_room).delete(delete_room),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelFilter {
    hotel_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityQuery {
    hotel_id: Option<i64>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

fn validate_room(room: &Room) -> ApiResult<()> {
    if room.hotel_id <= 0 {
        return Err(ApiError::validation("Valid hotel ID is required"));
    }
    require_text(&room.room_number, "Room number is required")?;
    require_text(&room.room_type, "Room type is required")?;
    if room.capacity <= 0 {
        return Err(ApiError::validation("Valid capacity is required"));
    }
    if room.price_per_night <= 0.0 {
        return Err(ApiError::validation("Valid price per night is required"));
    }
    Ok(())
}

fn load_room(state: &AppState, id: i64) -> ApiResult<Room> {
    require_id(id, "room")?;
    state
        .db
        .get_room(id)?
        .ok_or_else(|| ApiError::not_found("Room not found"))
}

async fn list_rooms(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<HotelFilter>,
) -> ApiResult<Json<Value>> {
    let rooms = state.db.list_rooms(filter.hotel_id, query.search())?;
    paginate("rooms", rooms, &query)
}

async fn rooms_for_hotel(
    State(state): State<AppState>,
    ApiPath(hotel_id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    require_id(hotel_id, "hotel")?;
    let rooms = state.db.list_rooms(Some(hotel_id), None)?;
    listing("rooms", rooms)
}

async fn available_rooms(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> ApiResult<Json<Value>> {
    let hotel_id = query
        .hotel_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation("Valid hotel ID is required"))?;
    let check_in = query
        .check_in
        .ok_or_else(|| ApiError::validation("Check-in date is required"))?;
    let check_out = query
        .check_out
        .ok_or_else(|| ApiError::validation("Check-out date is required"))?;
    if check_out <= check_in {
        return Err(ApiError::validation(
            "Check-out date must be after check-in date",
        ));
    }

    let rooms = state.db.available_rooms(hotel_id, check_in, check_out)?;
    listing("rooms", rooms)
}

async fn create_room(
    State(state): State<AppState>,
    ApiJson(room): ApiJson<Room>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_room(&room)?;
    let stored = state.db.insert_room(&room)?;
    info!(room_id = stored.id, hotel_id = stored.hotel_id, "🛏️ Room added");

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Room added successfully", "room": stored})),
    ))
}

async fn get_room(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let room = load_room(&state, id)?;
    Ok(Json(json!({ "room": room })))
}

async fn update_room(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(room): ApiJson<Room>,
) -> ApiResult<Json<Value>> {
    load_room(&state, id)?;
    validate_room(&room)?;

    if !state.db.update_room(id, &room)? {
        return Err(ApiError::not_found("Room not found"));
    }
    let updated = load_room(&state, id)?;

    Ok(Json(json!({"message": "Room updated successfully", "room": updated})))
}

async fn delete_room(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    load_room(&state, id)?;
    state.db.deactivate_room(id)?;

    Ok(Json(json!({"message": "Room deleted successfully"})))
}
