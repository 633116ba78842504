//! `/api/dashboard` aggregates

use crate::api::routes::AppState;
use crate::error::ApiResult;
use crate::models::BookingStatus;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

const STATS_RECENT_BOOKINGS: usize = 10;
const SUMMARY_RECENT_BOOKINGS: usize = 5;

const CHART_COLOURS: [&str; 5] = ["#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#ef4444"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/overview", get(overview))
        .route("/api/dashboard/stats", get(stats))
        .route("/api/dashboard/booking-status-chart", get(booking_status_chart))
        .route("/api/dashboard/summary", get(summary))
}

fn status_key(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pendingBookings",
        BookingStatus::Confirmed => "confirmedBookings",
        BookingStatus::CheckedIn => "checkedInBookings",
        BookingStatus::CheckedOut => "checkedOutBookings",
        BookingStatus::Cancelled => "cancelledBookings",
    }
}

/// Totals shared by `overview` and `stats`
fn totals(state: &AppState) -> ApiResult<Map<String, Value>> {
    let db = &state.db;
    let by_status: HashMap<BookingStatus, i64> = db.booking_counts_by_status()?;

    let mut body = Map::new();
    body.insert("totalBookings".into(), json!(db.count_bookings()?));
    body.insert("totalRevenue".into(), json!(db.total_revenue()?));
    body.insert("totalHotels".into(), json!(db.count_active_hotels()?));
    body.insert("totalCustomers".into(), json!(db.count_customers()?));
    body.insert("totalRooms".into(), json!(db.count_active_rooms()?));
    for status in BookingStatus::ALL {
        let count = by_status.get(&status).copied().unwrap_or(0);
        body.insert(status_key(status).into(), json!(count));
    }

    Ok(body)
}

async fn overview(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(Value::Object(totals(&state)?)))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut body = totals(&state)?;
    body.insert("totalUsers".into(), json!(state.db.count_active_users()?));
    body.insert(
        "recentBookings".into(),
        json!(state.db.recent_bookings(STATS_RECENT_BOOKINGS)?),
    );
    Ok(Json(Value::Object(body)))
}

async fn booking_status_chart(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let by_status = state.db.booking_counts_by_status()?;

    let labels: Vec<&str> = BookingStatus::ALL.iter().map(|s| s.label()).collect();
    let data: Vec<i64> = BookingStatus::ALL
        .iter()
        .map(|s| by_status.get(s).copied().unwrap_or(0))
        .collect();

    Ok(Json(json!({
        "labels": labels,
        "data": data,
        "backgroundColor": CHART_COLOURS,
    })))
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let db = &state.db;
    Ok(Json(json!({
        "totalBookings": db.count_bookings()?,
        "totalRevenue": db.total_revenue()?,
        "activeHotels": db.count_active_hotels()?,
        "registeredCustomers": db.count_customers()?,
        "recentBookings": db.recent_bookings(SUMMARY_RECENT_BOOKINGS)?,
    })))
}
