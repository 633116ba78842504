//! Hotel booking backend
//! REST API over SQLite with JWT auth, per-client rate limiting and
//! security headers.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    net::TcpListener,
    time::{interval, Instant},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotel_booking_backend::{
    api::{build_router, AppState},
    auth::BcryptHasher,
    config::Config,
    db::Database,
    middleware::RateLimiter,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    config.validate()?;

    info!("🏨 Hotel booking backend starting");
    if config.uses_dev_secret() {
        warn!("⚠️  JWT_SECRET not set, using the development secret");
    }

    let db_path = config.resolved_database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    info!("💾 Database ready at {}", db_path);

    if config.seed_admin {
        let hasher = BcryptHasher::new();
        let seed_db = db.clone();
        tokio::task::spawn_blocking(move || seed_db.seed_default_admin(&hasher))
            .await
            .context("Admin seeding task failed")??;
    }

    let state = AppState::from_config(db, &config);
    spawn_limiter_eviction(state.limiter.clone(), config.rate_limit_window());

    let app = build_router(state, config.cors_origins());

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

/// Drops rate limit windows of clients that have gone quiet for a full window.
fn spawn_limiter_eviction(limiter: Arc<RateLimiter>, window: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(window);
        loop {
            ticker.tick().await;
            let evicted = limiter.evict_idle(Instant::now().into_std());
            if evicted > 0 {
                debug!(
                    evicted,
                    tracked = limiter.tracked_clients(),
                    "Evicted idle rate limit windows"
                );
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotel_booking_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory, for runs with --manifest-path from elsewhere
    let env_file = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if env_file.exists() {
        let _ = dotenv::from_path(&env_file);
    }
}
