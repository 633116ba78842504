//! End-to-end tests against the full router
//!
//! Each test builds the complete middleware stack over a fresh SQLite file
//! in a temporary directory and drives it with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hotel_booking_backend::api::{build_router, AppState};
use hotel_booking_backend::auth::BcryptHasher;
use hotel_booking_backend::db::Database;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    _dir: TempDir,
    router: Router,
    state: AppState,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hotel_booking.db");
    let db = Database::open(path.to_str().unwrap()).unwrap();
    let state = AppState::for_tests(db);
    Harness {
        router: build_router(state.clone(), None),
        state,
        _dir: dir,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn register_login_and_book() {
    let h = harness();

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": "guest1", "email": "guest1@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "CUSTOMER");

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "guest1", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = call(&h.router, "POST", "/api/auth/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["username"], "guest1");

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/bookings",
        Some(&token),
        Some(json!({
            "customerId": 1,
            "hotelId": 1,
            "checkInDate": "2026-09-10",
            "checkOutDate": "2026-09-10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Check-out date must be after check-in date");

    let (status, _) = call(
        &h.router,
        "POST",
        "/api/bookings",
        Some(&token),
        Some(json!({
            "customerId": 1,
            "hotelId": 1,
            "checkInDate": "2026-09-10",
            "checkOutDate": "2026-09-12",
            "totalAmount": 240.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(h.state.db.count_bookings().unwrap(), 1);
}

#[tokio::test]
async fn seeded_admin_can_manage_hotels() {
    let h = harness();
    assert!(h
        .state
        .db
        .seed_default_admin(&BcryptHasher::with_cost(4))
        .unwrap());

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "admin123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = call(
        &h.router,
        "POST",
        "/api/hotels",
        Some(&token),
        Some(json!({"name": "Harbour View", "address": "1 Quay Street", "city": "Lisbon", "starRating": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&h.router, "GET", "/api/hotels", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalElements"], 1);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = harness();
    h.state
        .db
        .seed_default_admin(&BcryptHasher::with_cost(4))
        .unwrap();

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn hundred_and_first_request_is_throttled() {
    let h = harness();

    for _ in 0..100 {
        let (status, _) = call(&h.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&h.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["status"], 429);
    assert_eq!(body["error"], "Too many requests. Please try again later.");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let h = harness();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = h.router.clone().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}
