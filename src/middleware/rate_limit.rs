//! Rate limiting middleware.
//!
//! One sliding window per client address. The window remembers the instants
//! of the last `capacity` admissions, so no client is ever admitted more than
//! `capacity` times within any span of `window`. A client that stays quiet
//! for a full window is back to its full quota.

use crate::error::ApiError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Admission log for one client.
#[derive(Debug)]
pub struct ClientWindow {
    capacity: usize,
    window: Duration,
    admitted: VecDeque<Instant>,
}

impl ClientWindow {
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity as usize;
        Self {
            capacity,
            window,
            admitted: VecDeque::with_capacity(capacity),
        }
    }

    /// Forget admissions that are a full window old.
    fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit one request, or report how long until the oldest admission expires.
    pub fn try_admit(&mut self, now: Instant) -> Result<(), Duration> {
        self.expire(now);

        if self.admitted.len() < self.capacity {
            // Instants never go backwards inside the log
            let at = self.admitted.back().map_or(now, |&last| last.max(now));
            self.admitted.push_back(at);
            return Ok(());
        }

        match self.admitted.front() {
            Some(&oldest) => Err((oldest + self.window).saturating_duration_since(now)),
            None => Err(self.window),
        }
    }

    /// True when nothing inside the current window has been admitted.
    pub fn is_idle(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.admitted.is_empty()
    }
}

/// Process-wide client map, shared by every request.
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    clients: RwLock<HashMap<String, Arc<Mutex<ClientWindow>>>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// The window for `key`, created on first use. Concurrent first requests
    /// from one client always receive the same window.
    pub fn client(&self, key: &str) -> Arc<Mutex<ClientWindow>> {
        if let Some(window) = self.clients.read().get(key) {
            return window.clone();
        }

        self.clients
            .write()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ClientWindow::new(self.capacity, self.window))))
            .clone()
    }

    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        self.client(key).lock().try_admit(now)
    }

    /// Drop windows with no recent admissions that no request is holding.
    /// A fresh window would admit exactly the same requests. Returns the
    /// number removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|_, window| Arc::strong_count(window) > 1 || !window.lock().is_idle(now));
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.read().len()
    }
}

/// First `X-Forwarded-For` entry, else the peer IP, else `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Rate limiting middleware function.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);

    match limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let retry_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            warn!(
                client = %client,
                path = %request.uri().path(),
                retry_after_secs = retry_secs,
                "Rate limit exceeded"
            );

            (
                [(header::RETRY_AFTER, retry_secs.to_string())],
                ApiError::RateLimited,
            )
                .into_response()
        }
    }
}
