use axum::{middleware, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{bookings, customers, dashboard, hotels, rooms, users};
use crate::auth::{
    api as auth_api, auth_middleware, AccessPolicy, AuthGuard, AuthService, BcryptHasher,
    PasswordHasher, TokenService,
};
use crate::config::Config;
use crate::db::Database;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_logging, security_headers, RateLimiter,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub limiter: Arc<RateLimiter>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(
        db: Database,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            Arc::new(db.clone()),
            hasher.clone(),
            tokens.clone(),
        ));

        Self {
            db,
            auth,
            tokens,
            hasher,
            limiter,
            policy: Arc::new(AccessPolicy::default_table()),
        }
    }

    pub fn from_config(db: Database, config: &Config) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.jwt_secret.clone(),
            config.jwt_expiration(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_capacity,
            config.rate_limit_window(),
        ));

        Self::new(db, Arc::new(BcryptHasher::new()), tokens, limiter)
    }

    /// Fast hashing and a fixed secret, for router tests
    pub fn for_tests(db: Database) -> Self {
        let tokens = Arc::new(TokenService::new(
            "router-test-secret".to_string(),
            Duration::from_secs(3600),
        ));
        let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60)));

        Self::new(db, Arc::new(BcryptHasher::with_cost(4)), tokens, limiter)
    }
}

/// Full router. Layers, outermost first: request logging, CORS, security
/// headers, rate limiting, auth guard.
pub fn build_router(state: AppState, cors_origins: Option<Vec<String>>) -> Router {
    let guard = AuthGuard {
        tokens: state.tokens.clone(),
        policy: state.policy.clone(),
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(hotels::router())
        .merge(rooms::router())
        .merge(customers::router())
        .merge(bookings::router())
        .merge(users::router())
        .merge(dashboard::router())
        .with_state(state.clone())
        .merge(auth_api::router(state.auth.clone()))
        .layer(middleware::from_fn_with_state(guard, auth_middleware))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(cors_origins))
        .layer(middleware::from_fn(request_logging))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
