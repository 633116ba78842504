//! Request-processing filters.
//!
//! This module provides:
//! - Request logging with request ids and latency tracking
//! - Rate limiting per client address
//! - CORS and security headers

pub mod logging;
pub mod rate_limit;
pub mod security;

pub use logging::request_logging;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use security::{cors_layer, security_headers};
