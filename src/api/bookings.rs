//! `/api/bookings` endpoints

use crate::api::common::{listing, paginate, require_id, PageQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::routes::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Booking, BookingStatus};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/customer/:customer_id", get(bookings_for_customer))
        .route("/api/bookings/hotel/:hotel_id", get(bookings_for_hotel))
        .route("/api/bookings/:id/status", put(update_status))
        .route("/api/bookings/:id", get(get_booking).delete(delete_booking))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(default)]
    status: String,
}

/// Stays are half-open: check-out must fall strictly after check-in
fn validate_booking(booking: &Booking) -> ApiResult<()> {
    if booking.customer_id <= 0 {
        return Err(ApiError::validation("Valid customer ID is required"));
    }
    if booking.hotel_id <= 0 {
        return Err(ApiError::validation("Valid hotel ID is required"));
    }
    let check_in = booking
        .check_in_date
        .ok_or_else(|| ApiError::validation("Check-in date is required"))?;
    let check_out = booking
        .check_out_date
        .ok_or_else(|| ApiError::validation("Check-out date is required"))?;
    if check_out <= check_in {
        return Err(ApiError::validation(
            "Check-out date must be after check-in date",
        ));
    }
    if booking.total_amount.is_some_and(|amount| amount < 0.0) {
        return Err(ApiError::validation("Total amount must not be negative"));
    }
    Ok(())
}

fn load_booking(state: &AppState, id: i64) -> ApiResult<Booking> {
    require_id(id, "booking")?;
    state
        .db
        .get_booking(id)?
        .ok_or_else(|| ApiError::not_found("Booking not found"))
}

async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Value>> {
    let bookings = state.db.list_bookings()?;
    paginate("bookings", bookings, &query)
}

async fn create_booking(
    State(state): State<AppState>,
    ApiJson(booking): ApiJson<Booking>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_booking(&booking)?;
    let stored = state.db.insert_booking(&booking)?;
    info!(
        booking_id = stored.id,
        customer_id = stored.customer_id,
        hotel_id = stored.hotel_id,
        status = stored.status.as_str(),
        "📅 Booking added"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Booking added successfully", "booking": stored})),
    ))
}

async fn get_booking(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let booking = load_booking(&state, id)?;
    Ok(Json(json!({ "booking": booking })))
}

async fn bookings_for_customer(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    require_id(customer_id, "customer")?;
    listing("bookings", state.db.bookings_for_customer(customer_id)?)
}

async fn bookings_for_hotel(
    State(state): State<AppState>,
    ApiPath(hotel_id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    require_id(hotel_id, "hotel")?;
    listing("bookings", state.db.bookings_for_hotel(hotel_id)?)
}

async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Value>> {
    load_booking(&state, id)?;
    let status = BookingStatus::parse(update.status.trim())
        .ok_or_else(|| ApiError::validation("Invalid booking status"))?;

    if !state.db.update_booking_status(id, status)? {
        return Err(ApiError::not_found("Booking not found"));
    }
    let updated = load_booking(&state, id)?;
    info!(booking_id = id, status = status.as_str(), "Booking status changed");

    Ok(Json(json!({"message": "Booking status updated successfully", "booking": updated})))
}

async fn delete_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    load_booking(&state, id)?;
    state.db.delete_booking(id)?;

    Ok(Json(json!({"message": "Booking deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use crate::api::routes::tests::TestApp;
    use crate::auth::models::UserRole;
    use axum::http::StatusCode;
    use serde_json::json;

    fn booking(check_in: &str, check_out: &str) -> serde_json::Value {
        json!({
            "customerId": 1,
            "hotelId": 1,
            "checkInDate": check_in,
            "checkOutDate": check_out,
            "totalAmount": 300.0
        })
    }

    #[tokio::test]
    async fn test_equal_dates_rejected() {
        let app = TestApp::new();
        let token = app.token(UserRole::Customer);

        let (status, body) = app
            .send(
                "POST",
                "/api/bookings",
                Some(&token),
                Some(booking("2026-08-01", "2026-08-01")),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Check-out date must be after check-in date");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let app = TestApp::new();
        let token = app.token(UserRole::Customer);

        let (status, body) = app
            .send(
                "POST",
                "/api/bookings",
                Some(&token),
                Some(json!({"customerId": 1, "hotelId": 1, "checkInDate": "2026-08-01"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Check-out date is required");

        let (status, body) = app
            .send(
                "POST",
                "/api/bookings",
                Some(&token),
                Some(json!({"hotelId": 1, "checkInDate": "2026-08-01", "checkOutDate": "2026-08-02"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Valid customer ID is required");
    }

    #[tokio::test]
    async fn test_malformed_requests_answer_json_400() {
        let app = TestApp::new();
        let token = app.token(UserRole::Customer);

        let (status, body) = app
            .send(
                "POST",
                "/api/bookings",
                Some(&token),
                Some(booking("not-a-date", "2026-08-04")),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        let (status, body) = app
            .send_raw("POST", "/api/bookings", Some(&token), Some("{broken".to_string()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, body) = app.send("GET", "/api/bookings/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid path parameter"));

        let (status, body) = app
            .send("GET", "/api/bookings?page=abc", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query parameters"));
    }

    #[tokio::test]
    async fn test_booking_flow() {
        let app = TestApp::new();
        let token = app.token(UserRole::Customer);

        let (status, body) = app
            .send(
                "POST",
                "/api/bookings",
                Some(&token),
                Some(booking("2026-08-01", "2026-08-04")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["booking"]["status"], "PENDING");
        let id = body["booking"]["id"].as_i64().unwrap();

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/bookings/{}/status", id),
                Some(&token),
                Some(json!({"status": "CONFIRMED"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booking"]["status"], "CONFIRMED");

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/bookings/{}/status", id),
                Some(&token),
                Some(json!({"status": "LOST"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid booking status");

        let (_, body) = app
            .send("GET", "/api/bookings/customer/1", Some(&token), None)
            .await;
        assert_eq!(body["totalElements"], 1);

        let (_, body) = app.send("GET", "/api/bookings", Some(&token), None).await;
        assert_eq!(body["bookings"][0]["id"], id);

        let (status, _) = app
            .send("DELETE", &format!("/api/bookings/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send("GET", &format!("/api/bookings/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Booking not found");
    }
}
