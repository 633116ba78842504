//! Authentication Middleware
//! Verify bearer tokens and enforce the access policy before any handler runs

use crate::auth::{
    jwt::TokenService,
    policy::{Access, AccessPolicy},
};
use crate::error::AuthError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AuthGuard {
    pub tokens: Arc<TokenService>,
    pub policy: Arc<AccessPolicy>,
}

/// `Some(token)` for an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(guard): State<AuthGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Preflight requests never carry credentials
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let access = guard.policy.access_for(&method, &path);

    let claims = match bearer_token(req.headers()) {
        Some(token) => match guard.tokens.claims(token) {
            Ok(claims) => Some(claims),
            // A stale token on a public route is simply ignored
            Err(_) if access == Access::Public => None,
            Err(e) => {
                warn!(method = %method, path = %path, "Rejected invalid token");
                return Err(e);
            }
        },
        None => None,
    };

    if let Err(e) = guard.policy.guard(&method, &path, claims.as_ref()) {
        if matches!(e, AuthError::Forbidden) {
            warn!(
                method = %method,
                path = %path,
                user = claims.as_ref().map(|c| c.sub.as_str()).unwrap_or_default(),
                "Access denied"
            );
        }
        return Err(e);
    }

    // Add claims to request extensions so handlers can access them
    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}
